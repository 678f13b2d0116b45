//! Playback-related types as the UI consumes them

use std::ops::RangeInclusive;

use chrono::Duration;

use super::content::Streamable;

pub const PLAYBACK_PROGRESS_RANGE: RangeInclusive<f32> = 0.0..=100.0;

/// Durable playback state observed by the UI
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum UiPlaybackState {
    #[default]
    Idle,
    /// Buffering; keeps the track that was playing before for continuity
    Loading { previous: Option<Streamable> },
    Playing { streamable: Streamable },
    Paused { streamable: Streamable },
    Ended { streamable: Streamable },
    Error { message: String },
}

impl UiPlaybackState {
    /// Track currently loaded in the player, if any
    pub fn streamable(&self) -> Option<&Streamable> {
        match self {
            UiPlaybackState::Playing { streamable }
            | UiPlaybackState::Paused { streamable }
            | UiPlaybackState::Ended { streamable } => Some(streamable),
            UiPlaybackState::Loading { previous } => previous.as_ref(),
            UiPlaybackState::Idle | UiPlaybackState::Error { .. } => None,
        }
    }
}

/// One-shot notification, consumed at most once.
///
/// Deliberately not `PartialEq`: two identical failures in a row are two
/// distinct events.
#[derive(Clone, Debug)]
pub enum PlaybackEvent {
    PlaybackError { message: String },
}

/// `MM:SS` below one hour, `HHMM:SS` from one hour on
pub fn convert_timestamp_millis_to_string(millis: u64) -> String {
    let duration = Duration::milliseconds(millis.min(i64::MAX as u64) as i64);
    let hours = duration.num_hours();
    let minutes = duration.num_minutes() % 60;
    let seconds = duration.num_seconds() % 60;

    if hours == 0 {
        format!("{:02}:{:02}", minutes, seconds)
    } else {
        format!("{:02}{:02}:{:02}", hours, minutes, seconds)
    }
}

/// Playback progress in percent, clamped to [`PLAYBACK_PROGRESS_RANGE`]
pub fn progress_fraction(position_ms: u64, total_duration_ms: u64) -> f32 {
    if total_duration_ms == 0 {
        return *PLAYBACK_PROGRESS_RANGE.start();
    }
    let percent = (position_ms as f64 / total_duration_ms as f64 * 100.0) as f32;
    percent.clamp(*PLAYBACK_PROGRESS_RANGE.start(), *PLAYBACK_PROGRESS_RANGE.end())
}

/// Summary of the artwork attached to the current track
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtworkSummary {
    pub content_type: Option<String>,
    pub size_bytes: usize,
}

/// Complete playback information for rendering the mini player
#[derive(Clone, Debug)]
pub struct PlaybackInfo {
    pub state: UiPlaybackState,
    pub elapsed_text: String,
    pub total_text: String,
    pub progress: f32,
    pub device_name: String,
    pub artwork: Option<ArtworkSummary>,
}

impl Default for PlaybackInfo {
    fn default() -> Self {
        Self {
            state: UiPlaybackState::Idle,
            elapsed_text: "00:00".to_string(),
            total_text: "00:00".to_string(),
            progress: 0.0,
            device_name: String::new(),
            artwork: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track() -> Streamable {
        Streamable {
            title: "Song".into(),
            detail: "Desc".into(),
            image_url: "http://img".into(),
            stream_uri: "http://stream".into(),
        }
    }

    #[test]
    fn formats_short_durations_as_minutes_and_seconds() {
        assert_eq!(convert_timestamp_millis_to_string(0), "00:00");
        assert_eq!(convert_timestamp_millis_to_string(65_000), "01:05");
        assert_eq!(convert_timestamp_millis_to_string(59 * 60_000 + 59_999), "59:59");
    }

    #[test]
    fn formats_long_durations_with_concatenated_hours() {
        assert_eq!(convert_timestamp_millis_to_string(3_665_000), "0101:05");
        assert_eq!(convert_timestamp_millis_to_string(3_600_000), "0100:00");
        assert_eq!(convert_timestamp_millis_to_string(10 * 3_600_000 + 61_000), "1001:01");
    }

    #[test]
    fn progress_is_a_percentage() {
        assert_eq!(progress_fraction(0, 200_000), 0.0);
        assert_eq!(progress_fraction(50_000, 200_000), 25.0);
        assert_eq!(progress_fraction(200_000, 200_000), 100.0);
    }

    #[test]
    fn progress_is_clamped_and_safe_without_duration() {
        assert_eq!(progress_fraction(250_000, 200_000), 100.0);
        assert_eq!(progress_fraction(10_000, 0), 0.0);
    }

    #[test]
    fn streamable_accessor_follows_variant() {
        let s = track();
        assert_eq!(
            UiPlaybackState::Paused { streamable: s.clone() }.streamable(),
            Some(&s)
        );
        assert_eq!(
            UiPlaybackState::Loading { previous: Some(s.clone()) }.streamable(),
            Some(&s)
        );
        assert_eq!(UiPlaybackState::Idle.streamable(), None);
        assert_eq!(UiPlaybackState::Error { message: "x".into() }.streamable(), None);
        assert_eq!(UiPlaybackState::Playing { streamable: s.clone() }.streamable(), Some(&s));
    }
}
