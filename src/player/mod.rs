//! Player module - the authoritative playback state
//!
//! [`MusicPlayer`] issues commands to the [`MediaEngine`] and turns its
//! notifications into a single deduplicated [`PlaybackState`] signal that
//! any number of observers can share.
//!
//! - `reconciler`: notification to state mapping
//! - `position`: per-`Playing` position sampler
//! - `shared_state`: replaying, lazily connected state signal

mod position;
mod reconciler;
mod shared_state;

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::audio::{EnginePhase, MediaEngine};
use crate::model::{Artwork, Streamable};

pub use position::PositionStream;
pub use reconciler::reconcile;
pub use shared_state::{PlaybackStateSubscription, SharedPlaybackState};

use shared_state::publish;

/// Playback state as far as the engine is concerned.
///
/// Equality ignores the position handle of `Playing`, so two `Playing`
/// states for the same track and duration compare equal.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Loading {
        previous: Option<Streamable>,
    },
    Playing {
        streamable: Streamable,
        total_duration_ms: u64,
        position: PositionStream,
    },
    Paused {
        streamable: Streamable,
    },
    Ended {
        streamable: Streamable,
    },
    Error,
}

impl PlaybackState {
    pub fn name(&self) -> &'static str {
        match self {
            PlaybackState::Idle => "idle",
            PlaybackState::Loading { .. } => "loading",
            PlaybackState::Playing { .. } => "playing",
            PlaybackState::Paused { .. } => "paused",
            PlaybackState::Ended { .. } => "ended",
            PlaybackState::Error => "error",
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct PlayerConfig {
    /// Sampling period of the position signal
    pub position_interval: Duration,
    /// How long the engine listener outlives its last subscriber
    pub replay_grace: Duration,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            position_interval: Duration::from_millis(250),
            replay_grace: Duration::from_millis(500),
        }
    }
}

struct NowPlaying {
    streamable: Streamable,
    artwork: Artwork,
}

type Tracked = Arc<RwLock<Option<NowPlaying>>>;

#[derive(Clone)]
pub struct MusicPlayer {
    engine: Arc<dyn MediaEngine>,
    now_playing: Tracked,
    state: SharedPlaybackState,
}

impl MusicPlayer {
    pub fn new(engine: Arc<dyn MediaEngine>, config: PlayerConfig) -> Self {
        let now_playing: Tracked = Arc::new(RwLock::new(None));

        let state = {
            let engine = engine.clone();
            let now_playing = now_playing.clone();
            SharedPlaybackState::new(config.replay_grace, move |tx| {
                listen(engine.clone(), now_playing.clone(), config.position_interval, tx)
            })
        };

        Self {
            engine,
            now_playing,
            state,
        }
    }

    /// Subscribe to the playback state; the latest state is delivered first
    pub fn playback_state(&self) -> PlaybackStateSubscription {
        self.state.subscribe()
    }

    /// Latest published state
    pub fn current_state(&self) -> PlaybackState {
        self.state.current()
    }

    pub fn currently_playing(&self) -> Option<Streamable> {
        self.now_playing.read().as_ref().map(|now| now.streamable.clone())
    }

    pub fn current_artwork(&self) -> Option<Artwork> {
        self.now_playing.read().as_ref().map(|now| now.artwork.clone())
    }

    /// Play `streamable`, restarting it if the engine still holds it
    pub fn play_streamable(&self, streamable: &Streamable, artwork: Artwork) {
        let mut now_playing = self.now_playing.write();
        // Stop and engine errors unload the media but keep the tracked track
        let engine_loaded = self.engine.snapshot().phase != EnginePhase::Idle;

        if let Some(current) = now_playing
            .as_mut()
            .filter(|now| engine_loaded && &now.streamable == streamable)
        {
            tracing::debug!(title = %streamable.title, "Restarting current track");
            current.artwork = artwork;
            self.engine.seek_to(0);
            self.engine.play();
            return;
        }

        if now_playing.is_some() {
            self.engine.stop();
        }

        tracing::info!(title = %streamable.title, uri = %streamable.stream_uri, "Loading track");
        *now_playing = Some(NowPlaying {
            streamable: streamable.clone(),
            artwork,
        });
        self.engine.load_and_play(&streamable.stream_uri);
    }

    pub fn pause_currently_playing_track(&self) {
        self.engine.pause();
    }

    pub fn stop_playing_track(&self) {
        self.engine.stop();
    }

    /// Resume a loaded but paused track. Returns `false` when there is
    /// nothing to resume or audio is already playing.
    pub fn try_resume(&self) -> bool {
        if self.engine.is_playing() || self.now_playing.read().is_none() {
            return false;
        }
        self.engine.play();
        true
    }
}

/// Forward engine notifications into the shared state until aborted.
///
/// Subscribes before spawning so no notification sent after `connect`
/// returns is missed.
fn listen(
    engine: Arc<dyn MediaEngine>,
    tracked: Tracked,
    interval: Duration,
    tx: Arc<watch::Sender<PlaybackState>>,
) -> JoinHandle<()> {
    let mut notifications = engine.subscribe();

    tokio::spawn(async move {
        loop {
            let notification = match notifications.recv().await {
                Ok(notification) => notification,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Playback listener fell behind engine notifications");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };

            if let Some(error) = &notification.error {
                tracing::warn!(error = %error, "Engine reported an error");
            }

            let streamable = tracked.read().as_ref().map(|now| now.streamable.clone());
            let next = reconcile(&notification, streamable.as_ref(), || {
                PositionStream::new(engine.clone(), interval)
            });

            if let Some(next) = next {
                let name = next.name();
                if publish(&tx, next) {
                    tracing::debug!(state = name, "Playback state changed");
                }
            }
        }
    })
}
