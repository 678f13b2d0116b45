//! Player state observer feeding the UI playback signals

use std::pin::pin;
use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::model::{
    convert_timestamp_millis_to_string, progress_fraction, PlaybackEvent, UiPlaybackState,
};
use crate::player::{MusicPlayer, PlaybackState, PositionStream};

use super::playback::{PlaybackSignals, PLAYBACK_ERROR_MESSAGE};

/// Mirror every player state into the UI signals.
///
/// The subscription is taken before spawning so the player connects to the
/// engine as soon as the controller exists.
pub(super) fn spawn_observer(
    player: &MusicPlayer,
    signals: Arc<PlaybackSignals>,
    events: mpsc::Sender<PlaybackEvent>,
) -> JoinHandle<()> {
    let mut states = player.playback_state();
    tracing::info!("Starting playback state observer");

    tokio::spawn(async move {
        while let Some(state) = states.next().await {
            tracing::debug!(state = state.name(), "Playback state observed");

            match state {
                PlaybackState::Idle => {
                    signals.reset_position();
                    signals.state.send_replace(UiPlaybackState::Idle);
                }
                PlaybackState::Playing {
                    total_duration_ms,
                    ref position,
                    ..
                } => {
                    signals
                        .total_duration_text
                        .send_replace(convert_timestamp_millis_to_string(total_duration_ms));
                    track_position(position.clone(), total_duration_ms, signals.clone());
                    signals.state.send_replace(ui_state(&state));
                }
                PlaybackState::Error => {
                    signals.state.send_replace(ui_state(&state));
                    let event = PlaybackEvent::PlaybackError {
                        message: PLAYBACK_ERROR_MESSAGE.to_string(),
                    };
                    if events.send(event).await.is_err() {
                        tracing::debug!("Playback observer shutting down");
                        break;
                    }
                }
                _ => {
                    signals.state.send_replace(ui_state(&state));
                }
            }
        }
    })
}

/// Durable UI state for a player state
pub(super) fn ui_state(state: &PlaybackState) -> UiPlaybackState {
    match state {
        PlaybackState::Idle => UiPlaybackState::Idle,
        PlaybackState::Loading { previous } => UiPlaybackState::Loading {
            previous: previous.clone(),
        },
        PlaybackState::Playing { streamable, .. } => UiPlaybackState::Playing {
            streamable: streamable.clone(),
        },
        PlaybackState::Paused { streamable } => UiPlaybackState::Paused {
            streamable: streamable.clone(),
        },
        PlaybackState::Ended { streamable } => UiPlaybackState::Ended {
            streamable: streamable.clone(),
        },
        PlaybackState::Error => UiPlaybackState::Error {
            message: PLAYBACK_ERROR_MESSAGE.to_string(),
        },
    }
}

/// Sample the position until the `Playing` state it belongs to is replaced
fn track_position(position: PositionStream, total_duration_ms: u64, signals: Arc<PlaybackSignals>) {
    tokio::spawn(async move {
        let mut samples = pin!(position.samples());
        while let Some(position_ms) = samples.next().await {
            tracing::trace!(position_ms, "Position sample");
            signals
                .elapsed_text
                .send_replace(convert_timestamp_millis_to_string(position_ms));
            signals
                .progress
                .send_replace(progress_fraction(position_ms, total_duration_ms));
        }
    });
}
