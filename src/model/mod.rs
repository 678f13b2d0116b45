//! Model module - Application state and data types
//!
//! This module contains all the data structures and state management for the application.
//! It is organized into submodules by responsibility:
//!
//! - `types`: Core UI state
//! - `playback`: UI-facing playback state, one-shot events and time formatting
//! - `content`: Catalog content (streamables, popular artists, per-screen load state)
//! - `catalog_client`: REST catalog client
//! - `artwork`: Artwork download
//! - `app_model`: Main application model with state management methods

mod types;
mod playback;
mod content;
mod catalog_client;
pub mod artwork;
mod app_model;

// Re-export all public types for convenient access
pub use types::UiState;

pub use playback::{
    ArtworkSummary, PlaybackEvent, PlaybackInfo, UiPlaybackState,
    convert_timestamp_millis_to_string, progress_fraction,
};

pub use content::{ContentState, ContentView, LoadState, PopularArtist, Streamable};

pub use catalog_client::CatalogClient;

pub use artwork::{Artwork, ArtworkDownloader, HttpArtworkDownloader};

pub use app_model::AppModel;
