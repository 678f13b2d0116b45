//! Navigation-related controller methods (popular artists, artist detail)

use crate::model::{ContentView, LoadState};
use super::AppController;

impl AppController {
    pub async fn load_popular_artists(&self) {
        let model = self.model.lock().await;
        model.set_popular_artists(LoadState::Loading).await;

        let Some(catalog) = model.get_catalog_client().await else {
            return;
        };
        drop(model);

        let result = catalog.popular_artists().await;
        match &result {
            Ok(artists) => tracing::info!(count = artists.len(), "Popular artists loaded"),
            Err(e) => tracing::error!(error = %e, "Failed to load popular artists"),
        }

        let model = self.model.lock().await;
        if let Err(e) = &result {
            model.set_error(Self::format_error(e)).await;
        }
        model.set_popular_artists(LoadState::from(result)).await;
    }

    pub async fn open_selected_artist(&self) {
        let model = self.model.lock().await;
        let Some(artist) = model.get_selected_artist().await else {
            return;
        };
        let Some(catalog) = model.get_catalog_client().await else {
            return;
        };

        tracing::debug!(permalink = %artist.permalink, "Opening artist detail");
        model.open_artist_detail(&artist).await;
        drop(model);

        let result = catalog.artist_streamables(&artist.permalink).await;
        if let Err(e) = &result {
            tracing::error!(permalink = %artist.permalink, error = %e, "Failed to load artist tracks");
        }

        let model = self.model.lock().await;
        model
            .set_artist_tracks(&artist.permalink, LoadState::from(result))
            .await;
    }

    /// Reload whatever the current screen shows after a failed load
    pub async fn retry_current_view(&self) {
        let model = self.model.lock().await;
        let content = model.get_content_state().await;
        drop(model);

        let view = content.view;
        let loading = match &view {
            ContentView::PopularArtists => content.popular_artists.is_loading(),
            ContentView::ArtistDetail { .. } => content.artist_tracks.is_loading(),
        };
        if loading {
            tracing::debug!("Screen is already loading, retry ignored");
            return;
        }

        match view {
            ContentView::PopularArtists => self.load_popular_artists().await,
            ContentView::ArtistDetail { .. } => {
                let model = self.model.lock().await;
                model.navigate_back().await;
                drop(model);
                self.open_selected_artist().await;
            }
        }
    }

    pub async fn go_back(&self) {
        let model = self.model.lock().await;
        if !model.navigate_back().await {
            tracing::trace!("Already on the top screen");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AppModel, PopularArtist};
    use std::time::Duration;

    fn artist(permalink: &str) -> PopularArtist {
        PopularArtist {
            permalink: permalink.to_string(),
            title: permalink.to_string(),
            content: None,
            track_count: 0,
            image_url: String::new(),
        }
    }

    #[tokio::test]
    async fn back_returns_to_popular_artists() {
        let controller = AppController::for_tests(AppModel::new(Duration::from_secs(5)));
        {
            let model = controller.model.lock().await;
            model.open_artist_detail(&artist("a")).await;
        }

        controller.go_back().await;

        let model = controller.model.lock().await;
        assert_eq!(model.current_view().await, ContentView::PopularArtists);
    }

    #[tokio::test]
    async fn opening_without_selection_does_nothing() {
        let controller = AppController::for_tests(AppModel::new(Duration::from_secs(5)));

        controller.open_selected_artist().await;

        let model = controller.model.lock().await;
        assert_eq!(model.current_view().await, ContentView::PopularArtists);
    }
}
