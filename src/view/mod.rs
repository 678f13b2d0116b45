//! View module - UI rendering
//!
//! This module handles all UI rendering for the application using ratatui.
//! It is organized into submodules by component type:
//!
//! - `utils`: Shared utility functions (truncation, scrollable lists)
//! - `layout`: Top bar
//! - `content`: Popular artists and artist detail screens
//! - `progress`: Mini player
//! - `overlays`: Modal overlays (error notification, help)

mod utils;
mod layout;
mod content;
mod progress;
mod overlays;

use ratatui::{
    layout::{Constraint, Direction, Layout},
    Frame,
};

use crate::model::{ContentState, PlaybackInfo, UiState};

pub struct AppView;

impl AppView {
    pub fn render(frame: &mut Frame, playback: &PlaybackInfo, ui_state: &UiState, content_state: &ContentState) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Screen title + device
                Constraint::Min(0),    // Main content
                Constraint::Length(3), // Mini player
            ])
            .split(frame.area());

        layout::render_top_bar(frame, chunks[0], content_state, &playback.device_name);

        let current_playing = playback.state.streamable().map(|s| s.stream_uri.as_str());
        content::render_main_content(frame, chunks[1], ui_state, content_state, current_playing);

        progress::render_mini_player(frame, chunks[2], playback);

        if ui_state.error_message.is_some() {
            overlays::render_error_notification(frame, ui_state);
        }

        if ui_state.show_help_popup {
            overlays::render_help_popup(frame);
        }
    }
}
