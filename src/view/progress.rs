//! Mini player rendering

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Gauge},
    Frame,
};

use crate::model::{PlaybackInfo, UiPlaybackState};
use super::utils::format_size;

fn status_text(state: &UiPlaybackState) -> (String, Color) {
    match state {
        UiPlaybackState::Idle => (" No track playing".to_string(), Color::DarkGray),
        UiPlaybackState::Loading { previous: Some(s) } => (format!(" ⏳ {} | {}", s.title, s.detail), Color::Yellow),
        UiPlaybackState::Loading { previous: None } => (" ⏳ Loading...".to_string(), Color::Yellow),
        UiPlaybackState::Playing { streamable } => (format!(" ▶ {} | {}", streamable.title, streamable.detail), Color::Green),
        UiPlaybackState::Paused { streamable } => (format!("⏸  {} | {}", streamable.title, streamable.detail), Color::Green),
        UiPlaybackState::Ended { streamable } => (format!(" ■ {} | {}", streamable.title, streamable.detail), Color::DarkGray),
        UiPlaybackState::Error { message } => (format!(" ✖ {}", message), Color::Red),
    }
}

pub fn render_mini_player(frame: &mut Frame, area: Rect, playback: &PlaybackInfo) {
    let (status, color) = status_text(&playback.state);

    let time_str = format!("{} / {}", playback.elapsed_text, playback.total_text);
    let ratio = (playback.progress as f64 / 100.0).clamp(0.0, 1.0);

    let artwork_info = match &playback.artwork {
        Some(artwork) => format!(
            " Artwork: {} ({}) | Space play/pause | S stop ",
            artwork.content_type.as_deref().unwrap_or("image"),
            format_size(artwork.size_bytes)
        ),
        None => " Space play/pause | S stop ".to_string(),
    };

    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("{} ", status))
                .title_bottom(Line::from(artwork_info).right_aligned()),
        )
        .gauge_style(Style::default().fg(color))
        .ratio(ratio)
        .label(time_str);

    frame.render_widget(gauge, area);
}
