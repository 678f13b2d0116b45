//! rodio-backed media engine
//!
//! rodio's `OutputStream` is not `Send`, so the stream and the active sink
//! live on a dedicated thread that drains a command queue. Media bytes are
//! fetched on the tokio runtime and handed back to that thread once they
//! have arrived.

use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use rodio::{Decoder, OutputStream, Sink, Source};
use tokio::runtime::Handle;
use tokio::sync::broadcast;

use super::{
    EngineEvents, EngineNotification, EnginePhase, EngineSnapshot, MediaEngine,
    NOTIFICATION_CAPACITY,
};

const POLL_INTERVAL: Duration = Duration::from_millis(50);
const AUDIO_THREAD_NAME: &str = "musify-audio";

type MediaBytes = Arc<[u8]>;

enum Command {
    Load { uri: String, generation: u64 },
    Prepared { generation: u64, bytes: MediaBytes },
    PrepareFailed { generation: u64, error: String },
    Play,
    Pause,
    Stop,
    Seek(u64),
    Shutdown,
}

/// State readable from any thread
struct Shared {
    snapshot: Mutex<EngineSnapshot>,
    position_ms: AtomicU64,
    generation: AtomicU64,
    notifications: broadcast::Sender<EngineNotification>,
}

impl Shared {
    /// Apply `mutate` to the snapshot and broadcast whatever changed
    fn update(
        &self,
        extra: EngineEvents,
        error: Option<String>,
        mutate: impl FnOnce(&mut EngineSnapshot),
    ) {
        let (mut events, snapshot) = {
            let mut snapshot = self.snapshot.lock();
            let before = snapshot.clone();
            mutate(&mut snapshot);
            (changed_attributes(&before, &snapshot) | extra, snapshot.clone())
        };
        if error.is_some() {
            events = events | EngineEvents::PLAYER_ERROR;
        }
        if events.is_empty() {
            return;
        }

        tracing::trace!(events = events.bits(), phase = ?snapshot.phase, "Engine notification");
        let _ = self.notifications.send(EngineNotification {
            events,
            snapshot,
            error,
        });
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }
}

fn changed_attributes(before: &EngineSnapshot, after: &EngineSnapshot) -> EngineEvents {
    let mut events = EngineEvents::empty();
    if before.phase != after.phase {
        events = events | EngineEvents::PLAYBACK_STATE_CHANGED;
    }
    if before.is_playing() != after.is_playing() {
        events = events | EngineEvents::IS_PLAYING_CHANGED;
    }
    if before.is_loading != after.is_loading {
        events = events | EngineEvents::IS_LOADING_CHANGED;
    }
    events
}

/// Media engine that streams over HTTP and plays through the default output device
pub struct RodioEngine {
    commands: mpsc::Sender<Command>,
    shared: Arc<Shared>,
}

impl RodioEngine {
    pub fn new(http: reqwest::Client) -> Result<Self> {
        let runtime = Handle::try_current()
            .context("RodioEngine must be created inside a tokio runtime")?;

        let (notifications, _) = broadcast::channel(NOTIFICATION_CAPACITY);
        let shared = Arc::new(Shared {
            snapshot: Mutex::new(EngineSnapshot::default()),
            position_ms: AtomicU64::new(0),
            generation: AtomicU64::new(0),
            notifications,
        });

        let (commands, queue) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::sync_channel(1);
        let worker = OutputWorker {
            commands: commands.clone(),
            shared: shared.clone(),
            runtime,
            http,
            loaded: None,
        };

        thread::Builder::new()
            .name(AUDIO_THREAD_NAME.to_string())
            .spawn(move || worker.run(queue, ready_tx))
            .context("Failed to spawn audio thread")?;

        ready_rx
            .recv()
            .context("Audio thread exited during start-up")??;

        tracing::info!("Audio output initialized");
        Ok(Self { commands, shared })
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            tracing::warn!("Audio thread is gone, dropping engine command");
        }
    }
}

impl MediaEngine for RodioEngine {
    fn load(&self, uri: &str) {
        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(uri = %uri, generation, "Loading media");
        self.send(Command::Load {
            uri: uri.to_string(),
            generation,
        });
    }

    fn play(&self) {
        self.send(Command::Play);
    }

    fn pause(&self) {
        self.send(Command::Pause);
    }

    fn stop(&self) {
        // Invalidate any download still in flight
        self.shared.generation.fetch_add(1, Ordering::SeqCst);
        self.send(Command::Stop);
    }

    fn seek_to(&self, position_ms: u64) {
        self.send(Command::Seek(position_ms));
    }

    fn snapshot(&self) -> EngineSnapshot {
        self.shared.snapshot.lock().clone()
    }

    fn position_ms(&self) -> u64 {
        self.shared.position_ms.load(Ordering::Relaxed)
    }

    fn subscribe(&self) -> broadcast::Receiver<EngineNotification> {
        self.shared.notifications.subscribe()
    }
}

impl Drop for RodioEngine {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Shutdown);
    }
}

struct Loaded {
    bytes: MediaBytes,
    sink: Sink,
}

struct OutputWorker {
    commands: mpsc::Sender<Command>,
    shared: Arc<Shared>,
    runtime: Handle,
    http: reqwest::Client,
    loaded: Option<Loaded>,
}

impl OutputWorker {
    fn run(mut self, queue: mpsc::Receiver<Command>, ready: mpsc::SyncSender<Result<()>>) {
        let (_stream, handle) = match OutputStream::try_default()
            .context("Failed to open the default audio output")
        {
            Ok(pair) => {
                let _ = ready.send(Ok(()));
                pair
            }
            Err(e) => {
                let _ = ready.send(Err(e));
                return;
            }
        };

        loop {
            match queue.recv_timeout(POLL_INTERVAL) {
                Ok(Command::Shutdown) => break,
                Ok(command) => self.handle(command, &handle),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
            self.poll();
        }

        tracing::debug!("Audio thread shutting down");
    }

    fn handle(&mut self, command: Command, handle: &rodio::OutputStreamHandle) {
        match command {
            Command::Load { uri, generation } => {
                self.loaded = None;
                self.shared.position_ms.store(0, Ordering::Relaxed);
                self.shared.update(EngineEvents::empty(), None, |s| {
                    s.phase = EnginePhase::Buffering;
                    s.is_loading = true;
                    s.duration_ms = None;
                });
                self.fetch(uri, generation);
            }
            Command::Prepared { generation, bytes } => {
                if !self.shared.is_current(generation) {
                    tracing::debug!(generation, "Discarding stale media");
                    return;
                }
                match prepare(handle, bytes) {
                    Ok((loaded, duration)) => {
                        let play_when_ready = self.shared.snapshot.lock().play_when_ready;
                        if play_when_ready {
                            loaded.sink.play();
                        } else {
                            loaded.sink.pause();
                        }
                        self.loaded = Some(loaded);
                        self.shared.update(EngineEvents::empty(), None, |s| {
                            s.phase = EnginePhase::Ready;
                            s.is_loading = false;
                            s.duration_ms = duration.map(|d| d.as_millis() as u64);
                        });
                    }
                    Err(e) => self.fail(format!("{:#}", e)),
                }
            }
            Command::PrepareFailed { generation, error } => {
                if self.shared.is_current(generation) {
                    self.fail(error);
                }
            }
            Command::Play => {
                if let Some(loaded) = &self.loaded {
                    loaded.sink.play();
                }
                self.shared
                    .update(EngineEvents::empty(), None, |s| s.play_when_ready = true);
            }
            Command::Pause => {
                if let Some(loaded) = &self.loaded {
                    loaded.sink.pause();
                }
                self.shared
                    .update(EngineEvents::empty(), None, |s| s.play_when_ready = false);
            }
            Command::Stop => {
                self.loaded = None;
                self.shared.position_ms.store(0, Ordering::Relaxed);
                self.shared.update(EngineEvents::empty(), None, |s| {
                    s.phase = EnginePhase::Idle;
                    s.is_loading = false;
                    s.duration_ms = None;
                });
            }
            Command::Seek(position_ms) => self.seek(position_ms),
            Command::Shutdown => {}
        }
    }

    fn seek(&mut self, position_ms: u64) {
        let Some(loaded) = &self.loaded else {
            return;
        };

        // A drained sink has consumed its source, rebuild it from the cached bytes
        if loaded.sink.empty() {
            match decode(&loaded.bytes) {
                Ok(source) => loaded.sink.append(source),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to rebuild source for seek");
                    return;
                }
            }
        }

        if let Err(e) = loaded.sink.try_seek(Duration::from_millis(position_ms)) {
            tracing::warn!(position_ms, error = %e, "Seek failed");
        }
        if self.shared.snapshot.lock().play_when_ready {
            loaded.sink.play();
        } else {
            loaded.sink.pause();
        }

        self.shared.position_ms.store(position_ms, Ordering::Relaxed);
        self.shared
            .update(EngineEvents::POSITION_DISCONTINUITY, None, |s| {
                if s.phase == EnginePhase::Ended {
                    s.phase = EnginePhase::Ready;
                }
            });
    }

    fn fail(&mut self, error: String) {
        tracing::error!(error = %error, "Playback failed");
        self.loaded = None;
        self.shared.update(EngineEvents::empty(), Some(error), |s| {
            s.phase = EnginePhase::Idle;
            s.is_loading = false;
        });
    }

    fn fetch(&self, uri: String, generation: u64) {
        let http = self.http.clone();
        let commands = self.commands.clone();
        self.runtime.spawn(async move {
            let command = match fetch_media(&http, &uri).await {
                Ok(bytes) => Command::Prepared { generation, bytes },
                Err(e) => Command::PrepareFailed {
                    generation,
                    error: format!("{:#}", e),
                },
            };
            let _ = commands.send(command);
        });
    }

    fn poll(&mut self) {
        let Some(loaded) = &self.loaded else {
            return;
        };

        self.shared
            .position_ms
            .store(loaded.sink.get_pos().as_millis() as u64, Ordering::Relaxed);

        let ready = self.shared.snapshot.lock().phase == EnginePhase::Ready;
        if ready && loaded.sink.empty() {
            tracing::debug!("End of media reached");
            self.shared
                .update(EngineEvents::empty(), None, |s| s.phase = EnginePhase::Ended);
        }
    }
}

fn decode(bytes: &MediaBytes) -> Result<Decoder<Cursor<MediaBytes>>> {
    Decoder::new(Cursor::new(Arc::clone(bytes))).context("Failed to decode media")
}

fn prepare(
    handle: &rodio::OutputStreamHandle,
    bytes: MediaBytes,
) -> Result<(Loaded, Option<Duration>)> {
    let source = decode(&bytes)?;
    let duration = source.total_duration();
    let sink = Sink::try_new(handle).context("Failed to create audio sink")?;
    sink.append(source);
    Ok((Loaded { bytes, sink }, duration))
}

async fn fetch_media(http: &reqwest::Client, uri: &str) -> Result<MediaBytes> {
    let response = http
        .get(uri)
        .send()
        .await
        .with_context(|| format!("Request for {} failed", uri))?
        .error_for_status()
        .context("Media host returned an error status")?;

    let bytes = response
        .bytes()
        .await
        .context("Failed to read media body")?;

    tracing::debug!(uri = %uri, size = bytes.len(), "Media downloaded");
    Ok(Arc::from(bytes.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(phase: EnginePhase, play_when_ready: bool, is_loading: bool) -> EngineSnapshot {
        EngineSnapshot {
            phase,
            play_when_ready,
            duration_ms: None,
            is_loading,
        }
    }

    #[test]
    fn becoming_ready_with_play_requested_flips_is_playing() {
        let before = snapshot(EnginePhase::Buffering, true, true);
        let after = snapshot(EnginePhase::Ready, true, false);

        let events = changed_attributes(&before, &after);

        assert!(events.contains(EngineEvents::PLAYBACK_STATE_CHANGED));
        assert!(events.contains(EngineEvents::IS_PLAYING_CHANGED));
        assert!(events.contains(EngineEvents::IS_LOADING_CHANGED));
    }

    #[test]
    fn pausing_only_reports_is_playing() {
        let before = snapshot(EnginePhase::Ready, true, false);
        let after = snapshot(EnginePhase::Ready, false, false);

        let events = changed_attributes(&before, &after);

        assert_eq!(events, EngineEvents::IS_PLAYING_CHANGED);
    }

    #[test]
    fn unchanged_snapshot_reports_nothing() {
        let state = snapshot(EnginePhase::Ended, true, false);
        assert!(changed_attributes(&state, &state).is_empty());
    }

    #[test]
    fn reaching_the_end_stops_playing() {
        let before = snapshot(EnginePhase::Ready, true, false);
        let after = snapshot(EnginePhase::Ended, true, false);

        let events = changed_attributes(&before, &after);

        assert!(events.contains(EngineEvents::PLAYBACK_STATE_CHANGED));
        assert!(events.contains(EngineEvents::IS_PLAYING_CHANGED));
        assert!(!events.contains(EngineEvents::IS_LOADING_CHANGED));
    }
}
