//! Playback orchestration and playback control methods

use std::sync::Arc;

use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;

use crate::model::{
    ArtworkDownloader, ArtworkSummary, PlaybackEvent, PlaybackInfo, Streamable, UiPlaybackState,
};
use crate::player::MusicPlayer;

use super::player_events;
use super::AppController;

pub const PLAYBACK_ERROR_MESSAGE: &str = "An error occurred. Please check internet connection.";

/// Pending one-shot events before senders start waiting
const EVENT_CAPACITY: usize = 16;

const ZERO_TIME: &str = "00:00";

/// Signals derived from the playback state, written only by the observer
/// task and by a failed `play_streamable`.
pub(crate) struct PlaybackSignals {
    pub state: watch::Sender<UiPlaybackState>,
    pub elapsed_text: watch::Sender<String>,
    pub total_duration_text: watch::Sender<String>,
    pub progress: watch::Sender<f32>,
}

impl PlaybackSignals {
    fn new() -> Self {
        Self {
            state: watch::channel(UiPlaybackState::Idle).0,
            elapsed_text: watch::channel(ZERO_TIME.to_string()).0,
            total_duration_text: watch::channel(ZERO_TIME.to_string()).0,
            progress: watch::channel(0.0).0,
        }
    }

    pub fn reset_position(&self) {
        self.elapsed_text.send_replace(ZERO_TIME.to_string());
        self.progress.send_replace(0.0);
    }
}

struct AbortOnDrop(JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// View-level coordinator between the UI and the [`MusicPlayer`].
///
/// Exposes the durable UI playback state and the one-shot event channel as
/// two independent streams.
#[derive(Clone)]
pub struct PlaybackController {
    player: MusicPlayer,
    artwork: Arc<dyn ArtworkDownloader>,
    signals: Arc<PlaybackSignals>,
    events_tx: mpsc::Sender<PlaybackEvent>,
    events_rx: Arc<Mutex<mpsc::Receiver<PlaybackEvent>>>,
    _observer: Arc<AbortOnDrop>,
}

impl PlaybackController {
    pub fn new(player: MusicPlayer, artwork: Arc<dyn ArtworkDownloader>) -> Self {
        let signals = Arc::new(PlaybackSignals::new());
        let (events_tx, events_rx) = mpsc::channel(EVENT_CAPACITY);
        let observer = player_events::spawn_observer(&player, signals.clone(), events_tx.clone());

        Self {
            player,
            artwork,
            signals,
            events_tx,
            events_rx: Arc::new(Mutex::new(events_rx)),
            _observer: Arc::new(AbortOnDrop(observer)),
        }
    }

    /// Download the artwork of `streamable`, then hand it to the player
    pub async fn play_streamable(&self, streamable: &Streamable) {
        match self.artwork.download(&streamable.image_url).await {
            Ok(artwork) => {
                tracing::debug!(title = %streamable.title, size = artwork.size_bytes(), "Artwork ready, starting playback");
                self.player.play_streamable(streamable, artwork);
                self.clear_artwork_error();
            }
            Err(e) => {
                tracing::warn!(title = %streamable.title, error = %e, "Artwork download failed, playback not started");
                self.signals.state.send_replace(UiPlaybackState::Error {
                    message: PLAYBACK_ERROR_MESSAGE.to_string(),
                });
                self.emit(PlaybackEvent::PlaybackError {
                    message: PLAYBACK_ERROR_MESSAGE.to_string(),
                })
                .await;
            }
        }
    }

    pub fn pause_currently_playing_track(&self) {
        self.player.pause_currently_playing_track();
    }

    /// Returns whether a resume command was issued
    pub fn resume_if_paused(&self) -> bool {
        self.player.try_resume()
    }

    pub fn stop_playing_track(&self) {
        self.player.stop_playing_track();
    }

    pub fn current_state(&self) -> UiPlaybackState {
        self.signals.state.borrow().clone()
    }

    pub fn currently_playing(&self) -> Option<Streamable> {
        self.player.currently_playing()
    }

    pub fn try_next_event(&self) -> Option<PlaybackEvent> {
        self.events_rx.try_lock().ok()?.try_recv().ok()
    }

    /// Everything the mini player renders, read in one go
    pub fn playback_info(&self, device_name: &str) -> PlaybackInfo {
        let artwork = self.player.current_artwork().map(|artwork| ArtworkSummary {
            content_type: artwork.content_type.clone(),
            size_bytes: artwork.size_bytes(),
        });

        PlaybackInfo {
            state: self.signals.state.borrow().clone(),
            elapsed_text: self.signals.elapsed_text.borrow().clone(),
            total_text: self.signals.total_duration_text.borrow().clone(),
            progress: *self.signals.progress.borrow(),
            device_name: device_name.to_string(),
            artwork,
        }
    }

    /// Replace an error left by a failed artwork download with the player's state
    fn clear_artwork_error(&self) {
        let current = player_events::ui_state(&self.player.current_state());
        self.signals.state.send_if_modified(|state| {
            if matches!(state, UiPlaybackState::Error { .. }) && *state != current {
                *state = current;
                true
            } else {
                false
            }
        });
    }

    async fn emit(&self, event: PlaybackEvent) {
        if self.events_tx.send(event).await.is_err() {
            tracing::debug!("Playback event receiver dropped");
        }
    }
}

// The TUI reads snapshots through `playback_info`
#[cfg(test)]
impl PlaybackController {
    pub fn state(&self) -> watch::Receiver<UiPlaybackState> {
        self.signals.state.subscribe()
    }

    pub fn elapsed_text(&self) -> watch::Receiver<String> {
        self.signals.elapsed_text.subscribe()
    }

    pub fn total_duration_text(&self) -> watch::Receiver<String> {
        self.signals.total_duration_text.subscribe()
    }

    pub fn progress(&self) -> watch::Receiver<f32> {
        self.signals.progress.subscribe()
    }

    /// Wait for the next one-shot event
    pub async fn next_event(&self) -> Option<PlaybackEvent> {
        self.events_rx.lock().await.recv().await
    }
}

impl AppController {
    /// Play the highlighted track, or replay the last one when nothing is highlighted
    pub async fn play_selected_track(&self) {
        let selected = self.model.lock().await.get_selected_track().await;
        let Some(track) = selected.or_else(|| self.playback.currently_playing()) else {
            return;
        };

        tracing::info!(title = %track.title, "Playing selected track");
        self.playback.play_streamable(&track).await;
    }

    pub async fn toggle_playback(&self) {
        let state = self.playback.current_state();
        tracing::debug!(?state, "Toggling playback");

        match &state {
            UiPlaybackState::Playing { .. } => self.playback.pause_currently_playing_track(),
            UiPlaybackState::Paused { .. } => {
                if !self.playback.resume_if_paused() {
                    tracing::debug!("Nothing to resume");
                }
            }
            // Same streamable again restarts it from the beginning
            UiPlaybackState::Ended { streamable } => self.playback.play_streamable(streamable).await,
            _ => self.play_selected_track().await,
        }
    }

    pub fn stop_playback(&self) {
        tracing::debug!("Stopping playback");
        self.playback.stop_playing_track();
    }

    /// Move pending one-shot playback events into the error notification
    pub async fn drain_playback_events(&self) {
        while let Some(event) = self.playback.try_next_event() {
            match event {
                PlaybackEvent::PlaybackError { message } => {
                    self.model.lock().await.set_error(message).await;
                }
            }
        }
    }

    pub fn playback_info(&self, device_name: &str) -> PlaybackInfo {
        self.playback.playback_info(device_name)
    }
}
