//! Catalog content shown on the two screens

use super::catalog_client::{ArtistResponse, TrackResponse};

/// A playable track as the player and the UI see it
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Streamable {
    pub title: String,
    pub detail: String,
    pub image_url: String,
    pub stream_uri: String,
}

impl From<&TrackResponse> for Streamable {
    fn from(track: &TrackResponse) -> Self {
        Self {
            title: track.title.clone(),
            detail: track.description.clone(),
            image_url: track.artwork_url.clone(),
            stream_uri: track.stream_url.clone(),
        }
    }
}

/// An artist entry on the popular artists screen
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PopularArtist {
    pub permalink: String,
    pub title: String,
    pub content: Option<String>,
    pub track_count: u32,
    pub image_url: String,
}

impl PopularArtist {
    /// Combine a popular track with the profile of the user who owns it
    pub fn new(artist: &ArtistResponse, track: &TrackResponse) -> Self {
        let content = Some(artist.description.trim().to_string()).filter(|c| !c.is_empty());
        Self {
            permalink: track.user.permalink.clone(),
            title: artist.username.clone(),
            content,
            track_count: artist.track_count,
            image_url: artist.avatar_url.clone(),
        }
    }
}

/// Per-screen loading tri-state
#[derive(Clone, Debug, PartialEq, Default)]
pub enum LoadState<T> {
    #[default]
    Loading,
    Ready(T),
    Error(Option<String>),
}

impl<T> LoadState<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            LoadState::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }
}

impl<T> From<anyhow::Result<T>> for LoadState<T> {
    fn from(result: anyhow::Result<T>) -> Self {
        match result {
            Ok(value) => LoadState::Ready(value),
            Err(e) => LoadState::Error(Some(e.to_string())),
        }
    }
}

/// Which screen the main area is showing
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum ContentView {
    #[default]
    PopularArtists,
    ArtistDetail { permalink: String, title: String },
}

#[derive(Clone, Debug, Default)]
pub struct ContentState {
    pub view: ContentView,
    pub popular_artists: LoadState<Vec<PopularArtist>>,
    pub artist_tracks: LoadState<Vec<Streamable>>,
}
