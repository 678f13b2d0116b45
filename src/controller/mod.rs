//! Controller module - Application logic and event handling
//!
//! This module contains the application controller that handles user input,
//! coordinates between the model and view, and owns playback orchestration.
//! It is organized into submodules by responsibility:
//!
//! - `input`: Key event handling
//! - `playback`: Playback orchestrator and playback control methods
//! - `navigation`: Popular artists / artist detail navigation
//! - `player_events`: Player state observer

mod input;
mod playback;
mod navigation;
mod player_events;

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::model::AppModel;

pub use playback::{PlaybackController, PLAYBACK_ERROR_MESSAGE};

#[derive(Clone)]
pub struct AppController {
    pub(crate) model: Arc<Mutex<AppModel>>,
    pub(crate) playback: PlaybackController,
}

impl AppController {
    pub fn new(model: Arc<Mutex<AppModel>>, playback: PlaybackController) -> Self {
        Self { model, playback }
    }

    pub(crate) fn format_error(error: &anyhow::Error) -> String {
        let error_str = format!("{:#}", error);

        if error_str.contains("404") {
            "Not found in the catalog.".to_string()
        } else if error_str.contains("429") {
            "Rate limited. Please wait a moment.".to_string()
        } else if error_str.contains("500") || error_str.contains("503") {
            "Catalog service is unavailable. Try again later.".to_string()
        } else if error_str.contains("error sending request") || error_str.contains("timed out") {
            PLAYBACK_ERROR_MESSAGE.to_string()
        } else if error_str.contains("decoding") {
            "Unexpected response from the catalog.".to_string()
        } else {
            format!("Error: {}", error)
        }
    }
}

#[cfg(test)]
impl AppController {
    /// Controller over a fake engine and a succeeding artwork stub
    pub(crate) fn for_tests(model: AppModel) -> Self {
        use crate::audio::testing::FakeEngine;
        use crate::model::artwork::testing::StubArtworkDownloader;
        use crate::player::{MusicPlayer, PlayerConfig};

        let player = MusicPlayer::new(Arc::new(FakeEngine::new()), PlayerConfig::default());
        let playback = PlaybackController::new(player, Arc::new(StubArtworkDownloader::succeeding()));
        Self::new(Arc::new(Mutex::new(model)), playback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn maps_http_failures_to_short_messages() {
        assert_eq!(
            AppController::format_error(&anyhow!("HTTP status client error (404 Not Found)")),
            "Not found in the catalog."
        );
        assert_eq!(
            AppController::format_error(&anyhow!("operation timed out")),
            PLAYBACK_ERROR_MESSAGE
        );
    }

    #[test]
    fn keeps_context_in_fallback_message() {
        let error = anyhow!("disk full").context("Saving failed");
        assert_eq!(AppController::format_error(&error), "Error: Saving failed");
    }
}
