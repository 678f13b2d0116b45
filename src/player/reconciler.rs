//! Engine notification to playback state mapping

use crate::audio::{EngineEvents, EngineNotification, EnginePhase};
use crate::model::Streamable;

use super::{PlaybackState, PositionStream};

/// Attributes whose change may move the playback state
const RELEVANT_EVENTS: EngineEvents = EngineEvents::PLAYBACK_STATE_CHANGED
    .union(EngineEvents::PLAYER_ERROR)
    .union(EngineEvents::IS_PLAYING_CHANGED)
    .union(EngineEvents::IS_LOADING_CHANGED);

/// Derive the next playback state from one engine notification.
///
/// Rules are evaluated in priority order; `None` means the notification
/// carried nothing state-relevant. `position` is only invoked when a
/// `Playing` state is produced.
pub fn reconcile(
    notification: &EngineNotification,
    tracked: Option<&Streamable>,
    position: impl FnOnce() -> PositionStream,
) -> Option<PlaybackState> {
    let events = notification.events;
    if !events.intersects(RELEVANT_EVENTS) {
        return None;
    }

    let snapshot = &notification.snapshot;
    let playing_changed_while_ready =
        events.contains(EngineEvents::IS_PLAYING_CHANGED) && snapshot.phase == EnginePhase::Ready;

    if events.contains(EngineEvents::PLAYER_ERROR) {
        Some(PlaybackState::Error)
    } else if playing_changed_while_ready && snapshot.play_when_ready {
        tracked.map(|streamable| PlaybackState::Playing {
            streamable: streamable.clone(),
            total_duration_ms: snapshot.duration_ms.unwrap_or(0),
            position: position(),
        })
    } else if playing_changed_while_ready {
        tracked.map(|streamable| PlaybackState::Paused {
            streamable: streamable.clone(),
        })
    } else if snapshot.phase == EnginePhase::Idle {
        Some(PlaybackState::Idle)
    } else if snapshot.phase == EnginePhase::Ended {
        tracked.map(|streamable| PlaybackState::Ended {
            streamable: streamable.clone(),
        })
    } else if snapshot.is_loading {
        Some(PlaybackState::Loading {
            previous: tracked.cloned(),
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::EngineSnapshot;
    use crate::audio::testing::{FakeEngine, snapshot};
    use std::sync::Arc;
    use std::time::Duration;

    fn track() -> Streamable {
        Streamable {
            title: "Song".into(),
            detail: "Desc".into(),
            image_url: "http://img".into(),
            stream_uri: "http://stream".into(),
        }
    }

    fn notification(events: EngineEvents, snapshot: EngineSnapshot) -> EngineNotification {
        EngineNotification {
            events,
            snapshot,
            error: None,
        }
    }

    fn position() -> PositionStream {
        PositionStream::new(Arc::new(FakeEngine::new()), Duration::from_millis(250))
    }

    #[test]
    fn irrelevant_notifications_are_ignored() {
        let n = notification(
            EngineEvents::POSITION_DISCONTINUITY,
            snapshot(EnginePhase::Idle, false),
        );
        assert_eq!(reconcile(&n, Some(&track()), position), None);
    }

    #[test]
    fn error_wins_over_everything() {
        let n = notification(
            EngineEvents::PLAYER_ERROR | EngineEvents::IS_PLAYING_CHANGED,
            snapshot(EnginePhase::Ready, true),
        );
        assert_eq!(reconcile(&n, Some(&track()), position), Some(PlaybackState::Error));
    }

    #[test]
    fn ready_with_play_requested_is_playing() {
        let n = notification(
            EngineEvents::IS_PLAYING_CHANGED,
            snapshot(EnginePhase::Ready, true),
        );

        match reconcile(&n, Some(&track()), position) {
            Some(PlaybackState::Playing {
                streamable,
                total_duration_ms,
                position,
            }) => {
                assert_eq!(streamable, track());
                assert_eq!(total_duration_ms, 180_000);
                assert!(!position.is_finished());
            }
            other => panic!("expected Playing, got {:?}", other),
        }
    }

    #[test]
    fn ready_without_play_requested_is_paused() {
        let n = notification(
            EngineEvents::IS_PLAYING_CHANGED,
            snapshot(EnginePhase::Ready, false),
        );
        assert_eq!(
            reconcile(&n, Some(&track()), position),
            Some(PlaybackState::Paused { streamable: track() })
        );
    }

    #[test]
    fn ready_without_playing_change_emits_nothing() {
        let n = notification(
            EngineEvents::PLAYBACK_STATE_CHANGED | EngineEvents::IS_LOADING_CHANGED,
            EngineSnapshot {
                is_loading: false,
                ..snapshot(EnginePhase::Ready, false)
            },
        );
        assert_eq!(reconcile(&n, Some(&track()), position), None);
    }

    #[test]
    fn idle_phase_is_idle_even_without_a_track() {
        let n = notification(
            EngineEvents::PLAYBACK_STATE_CHANGED,
            snapshot(EnginePhase::Idle, false),
        );
        assert_eq!(reconcile(&n, None, position), Some(PlaybackState::Idle));
    }

    #[test]
    fn ended_phase_reports_the_tracked_streamable() {
        let n = notification(
            EngineEvents::PLAYBACK_STATE_CHANGED | EngineEvents::IS_PLAYING_CHANGED,
            snapshot(EnginePhase::Ended, true),
        );
        assert_eq!(
            reconcile(&n, Some(&track()), position),
            Some(PlaybackState::Ended { streamable: track() })
        );
    }

    #[test]
    fn buffering_is_loading_with_previous_track() {
        let n = notification(
            EngineEvents::PLAYBACK_STATE_CHANGED | EngineEvents::IS_LOADING_CHANGED,
            snapshot(EnginePhase::Buffering, true),
        );
        assert_eq!(
            reconcile(&n, Some(&track()), position),
            Some(PlaybackState::Loading { previous: Some(track()) })
        );
        assert_eq!(
            reconcile(&n, None, position),
            Some(PlaybackState::Loading { previous: None })
        );
    }

    #[test]
    fn track_dependent_states_need_a_tracked_streamable() {
        let playing = notification(
            EngineEvents::IS_PLAYING_CHANGED,
            snapshot(EnginePhase::Ready, true),
        );
        let ended = notification(
            EngineEvents::PLAYBACK_STATE_CHANGED,
            snapshot(EnginePhase::Ended, false),
        );

        assert_eq!(reconcile(&playing, None, position), None);
        assert_eq!(reconcile(&ended, None, position), None);
    }

    #[test]
    fn position_factory_only_runs_for_playing() {
        let n = notification(
            EngineEvents::IS_PLAYING_CHANGED,
            snapshot(EnginePhase::Ready, false),
        );
        let result = reconcile(&n, Some(&track()), || panic!("position requested for Paused"));
        assert!(matches!(result, Some(PlaybackState::Paused { .. })));
    }
}
