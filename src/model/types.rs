//! Core type definitions for the application

use std::time::Instant;

/// UI state for the application
#[derive(Clone, Debug, Default)]
pub struct UiState {
    pub artists_selected: usize,
    pub tracks_selected: usize,
    pub error_message: Option<String>,
    pub error_timestamp: Option<Instant>,
    pub show_help_popup: bool,
}
