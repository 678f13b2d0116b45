//! Audio module - the media engine seam
//!
//! Everything that produces sound sits behind the [`MediaEngine`] trait.
//! The engine owns decoding and output; the rest of the application only
//! issues commands and listens to [`EngineNotification`]s.
//!
//! - `rodio_backend`: production engine built on rodio
//! - `testing`: recording engine used by unit tests

mod rodio_backend;
#[cfg(test)]
pub mod testing;

use std::ops::BitOr;
use tokio::sync::broadcast;

pub use rodio_backend::RodioEngine;

const DEVICE_NAME: &str = "Musify-RS";

/// Buffered notifications per engine subscriber before it starts lagging
pub const NOTIFICATION_CAPACITY: usize = 64;

/// Coarse lifecycle phase reported by the engine
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum EnginePhase {
    #[default]
    Idle,
    Buffering,
    Ready,
    Ended,
}

/// Bitmask describing which engine attributes changed in one notification
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct EngineEvents(u8);

impl EngineEvents {
    pub const PLAYBACK_STATE_CHANGED: Self = Self(1 << 0);
    pub const PLAYER_ERROR: Self = Self(1 << 1);
    pub const IS_PLAYING_CHANGED: Self = Self(1 << 2);
    pub const IS_LOADING_CHANGED: Self = Self(1 << 3);
    pub const POSITION_DISCONTINUITY: Self = Self(1 << 4);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: Self) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for EngineEvents {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// Readable engine state at the moment a notification was produced
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct EngineSnapshot {
    pub phase: EnginePhase,
    pub play_when_ready: bool,
    pub duration_ms: Option<u64>,
    pub is_loading: bool,
}

impl EngineSnapshot {
    /// Audio is actually advancing
    pub fn is_playing(&self) -> bool {
        self.phase == EnginePhase::Ready && self.play_when_ready
    }
}

#[derive(Clone, Debug)]
pub struct EngineNotification {
    pub events: EngineEvents,
    pub snapshot: EngineSnapshot,
    pub error: Option<String>,
}

/// Command and observation surface of a media playback engine.
///
/// Commands are fire-and-forget: implementations queue them and report the
/// outcome through notifications, so the engine's own queue is the point
/// where concurrent callers get serialized.
pub trait MediaEngine: Send + Sync {
    /// Replace the current media item with `uri` and start preparing it.
    fn load(&self, uri: &str);

    fn play(&self);

    fn pause(&self);

    fn stop(&self);

    fn seek_to(&self, position_ms: u64);

    fn snapshot(&self) -> EngineSnapshot;

    fn position_ms(&self) -> u64;

    fn subscribe(&self) -> broadcast::Receiver<EngineNotification>;

    fn load_and_play(&self, uri: &str) {
        self.load(uri);
        self.play();
    }

    fn is_playing(&self) -> bool {
        self.snapshot().is_playing()
    }
}

/// Name shown for the local output device
pub fn device_name() -> String {
    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    format!("{}@{}", DEVICE_NAME, host)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_mask_combines_and_queries() {
        let events = EngineEvents::IS_PLAYING_CHANGED | EngineEvents::IS_LOADING_CHANGED;

        assert!(events.contains(EngineEvents::IS_PLAYING_CHANGED));
        assert!(events.contains(EngineEvents::IS_LOADING_CHANGED));
        assert!(!events.contains(EngineEvents::PLAYER_ERROR));
        assert!(events.intersects(EngineEvents::PLAYER_ERROR | EngineEvents::IS_LOADING_CHANGED));
        assert!(!events.intersects(EngineEvents::POSITION_DISCONTINUITY));
    }

    #[test]
    fn empty_mask_contains_nothing() {
        let events = EngineEvents::empty();
        assert!(events.is_empty());
        assert!(!events.contains(EngineEvents::empty()));
        assert_eq!(events.bits(), 0);
    }

    #[test]
    fn snapshot_is_playing_only_when_ready_and_requested() {
        let mut snapshot = EngineSnapshot {
            phase: EnginePhase::Ready,
            play_when_ready: true,
            ..Default::default()
        };
        assert!(snapshot.is_playing());

        snapshot.play_when_ready = false;
        assert!(!snapshot.is_playing());

        snapshot.play_when_ready = true;
        snapshot.phase = EnginePhase::Buffering;
        assert!(!snapshot.is_playing());
    }

    #[test]
    fn device_name_carries_prefix() {
        assert!(device_name().starts_with("Musify-RS@"));
    }
}
