//! Main application model with state management

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use super::catalog_client::CatalogClient;
use super::content::{ContentState, ContentView, LoadState, PopularArtist, Streamable};
use super::types::UiState;

/// Main application model containing all state
pub struct AppModel {
    pub catalog: Option<CatalogClient>,
    pub ui_state: Arc<Mutex<UiState>>,
    pub content_state: Arc<Mutex<ContentState>>,
    pub should_quit: Arc<Mutex<bool>>,
    device_name: Arc<Mutex<String>>,
    error_timeout: Duration,
}

impl AppModel {
    pub fn new(error_timeout: Duration) -> Self {
        Self {
            catalog: None,
            ui_state: Arc::new(Mutex::new(UiState::default())),
            content_state: Arc::new(Mutex::new(ContentState::default())),
            should_quit: Arc::new(Mutex::new(false)),
            device_name: Arc::new(Mutex::new(String::new())),
            error_timeout,
        }
    }

    pub fn set_catalog_client(&mut self, client: CatalogClient) {
        self.catalog = Some(client);
    }

    pub async fn get_catalog_client(&self) -> Option<CatalogClient> {
        self.catalog.clone()
    }

    pub async fn update_device_name(&self, name: String) {
        *self.device_name.lock().await = name;
    }

    pub async fn get_device_name(&self) -> String {
        self.device_name.lock().await.clone()
    }

    pub async fn should_quit(&self) -> bool {
        *self.should_quit.lock().await
    }

    pub async fn set_should_quit(&self, quit: bool) {
        *self.should_quit.lock().await = quit;
    }

    pub async fn get_ui_state(&self) -> UiState {
        self.ui_state.lock().await.clone()
    }

    pub async fn get_content_state(&self) -> ContentState {
        self.content_state.lock().await.clone()
    }

    // ========================================================================
    // Error notification
    // ========================================================================

    pub async fn set_error(&self, message: String) {
        let mut state = self.ui_state.lock().await;
        state.error_message = Some(message);
        state.error_timestamp = Some(Instant::now());
    }

    pub async fn clear_error(&self) {
        let mut state = self.ui_state.lock().await;
        state.error_message = None;
        state.error_timestamp = None;
    }

    pub async fn has_error(&self) -> bool {
        self.ui_state.lock().await.error_message.is_some()
    }

    pub async fn auto_clear_old_errors(&self) {
        let mut state = self.ui_state.lock().await;
        if let Some(timestamp) = state.error_timestamp {
            if timestamp.elapsed() >= self.error_timeout {
                state.error_message = None;
                state.error_timestamp = None;
            }
        }
    }

    // ========================================================================
    // Help popup
    // ========================================================================

    pub async fn show_help_popup(&self) {
        self.ui_state.lock().await.show_help_popup = true;
    }

    pub async fn hide_help_popup(&self) {
        self.ui_state.lock().await.show_help_popup = false;
    }

    pub async fn is_help_popup_open(&self) -> bool {
        self.ui_state.lock().await.show_help_popup
    }

    // ========================================================================
    // Screens
    // ========================================================================

    pub async fn set_popular_artists(&self, artists: LoadState<Vec<PopularArtist>>) {
        let count = artists.ready().map(Vec::len).unwrap_or(0);
        self.content_state.lock().await.popular_artists = artists;

        let mut ui = self.ui_state.lock().await;
        ui.artists_selected = ui.artists_selected.min(count.saturating_sub(1));
    }

    /// Switch to the detail screen of `artist`; its tracks start loading
    pub async fn open_artist_detail(&self, artist: &PopularArtist) {
        let mut content = self.content_state.lock().await;
        content.view = ContentView::ArtistDetail {
            permalink: artist.permalink.clone(),
            title: artist.title.clone(),
        };
        content.artist_tracks = LoadState::Loading;
        drop(content);

        self.ui_state.lock().await.tracks_selected = 0;
    }

    /// Store tracks if the detail screen for `permalink` is still showing
    pub async fn set_artist_tracks(&self, permalink: &str, tracks: LoadState<Vec<Streamable>>) {
        let mut content = self.content_state.lock().await;
        match &content.view {
            ContentView::ArtistDetail { permalink: current, .. } if current == permalink => {
                content.artist_tracks = tracks;
            }
            _ => {
                tracing::debug!(permalink, "Dropping tracks for a screen that is no longer shown");
            }
        }
    }

    /// Returns true if there was a screen to go back from
    pub async fn navigate_back(&self) -> bool {
        let mut content = self.content_state.lock().await;
        match content.view {
            ContentView::PopularArtists => false,
            ContentView::ArtistDetail { .. } => {
                content.view = ContentView::PopularArtists;
                true
            }
        }
    }

    pub async fn move_selection_up(&self) {
        let view = self.content_state.lock().await.view.clone();
        let mut ui = self.ui_state.lock().await;
        let selected = match view {
            ContentView::PopularArtists => &mut ui.artists_selected,
            ContentView::ArtistDetail { .. } => &mut ui.tracks_selected,
        };
        *selected = selected.saturating_sub(1);
    }

    pub async fn move_selection_down(&self) {
        let content = self.content_state.lock().await;
        let (view, count) = match &content.view {
            ContentView::PopularArtists => (
                content.view.clone(),
                content.popular_artists.ready().map(Vec::len).unwrap_or(0),
            ),
            ContentView::ArtistDetail { .. } => (
                content.view.clone(),
                content.artist_tracks.ready().map(Vec::len).unwrap_or(0),
            ),
        };
        drop(content);

        let mut ui = self.ui_state.lock().await;
        let selected = match view {
            ContentView::PopularArtists => &mut ui.artists_selected,
            ContentView::ArtistDetail { .. } => &mut ui.tracks_selected,
        };
        if *selected + 1 < count {
            *selected += 1;
        }
    }

    pub async fn get_selected_artist(&self) -> Option<PopularArtist> {
        let index = self.ui_state.lock().await.artists_selected;
        let content = self.content_state.lock().await;
        content.popular_artists.ready()?.get(index).cloned()
    }

    pub async fn get_selected_track(&self) -> Option<Streamable> {
        let index = self.ui_state.lock().await.tracks_selected;
        let content = self.content_state.lock().await;
        match content.view {
            ContentView::ArtistDetail { .. } => content.artist_tracks.ready()?.get(index).cloned(),
            ContentView::PopularArtists => None,
        }
    }

    pub async fn current_view(&self) -> ContentView {
        self.content_state.lock().await.view.clone()
    }
}
