//! REST catalog client (popular feed, artist profiles, artist tracks)

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use futures::future::try_join_all;
use reqwest::Url;
use serde::{Deserialize, Deserializer};

use super::content::{PopularArtist, Streamable};
use crate::{log_api_request, log_api_result};

const POPULAR_FEED_PAGE: u32 = 1;
const POPULAR_FEED_COUNT: u32 = 5;
const ARTIST_TRACKS_PAGE: u32 = 1;
const ARTIST_TRACKS_COUNT: u32 = 10;

#[derive(Clone, Debug, Deserialize)]
pub struct UserResponse {
    #[serde(default, deserialize_with = "nullable_string")]
    pub permalink: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub username: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub avatar_url: String,
}

/// Track summary as returned by the feed and artist track endpoints
#[derive(Clone, Debug, Deserialize)]
pub struct TrackResponse {
    #[serde(default, deserialize_with = "nullable_string")]
    pub id: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub title: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub description: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub artwork_url: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub stream_url: String,
    pub user: UserResponse,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ArtistResponse {
    #[serde(default, deserialize_with = "nullable_string")]
    pub permalink: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub username: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub description: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub avatar_url: String,
    #[serde(default, deserialize_with = "lenient_count")]
    pub track_count: u32,
}

fn nullable_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Counts arrive either as JSON numbers or as numeric strings
fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Number(u32),
        Text(String),
    }

    match Option::<Count>::deserialize(deserializer)? {
        None => Ok(0),
        Some(Count::Number(n)) => Ok(n),
        Some(Count::Text(s)) if s.trim().is_empty() => Ok(0),
        Some(Count::Text(s)) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// First track of every distinct owner, in feed order
fn unique_owners(tracks: &[TrackResponse]) -> Vec<&TrackResponse> {
    let mut seen = HashSet::new();
    tracks
        .iter()
        .filter(|track| !track.user.permalink.is_empty())
        .filter(|track| seen.insert(track.user.permalink.as_str()))
        .collect()
}

#[derive(Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    base_url: Arc<str>,
}

impl CatalogClient {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: Arc::from(base_url.trim_end_matches('/')),
        }
    }

    /// An empty last segment yields a trailing slash
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .with_context(|| format!("Invalid catalog base URL: {}", self.base_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("Catalog base URL cannot carry a path: {}", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<T> {
        let response = self
            .http
            .get(url.clone())
            .query(query)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?
            .error_for_status()?;

        response
            .json::<T>()
            .await
            .with_context(|| format!("Unexpected response body from {}", url))
    }

    pub async fn popular_tracks(&self) -> Result<Vec<TrackResponse>> {
        log_api_request!("popular_tracks", page = POPULAR_FEED_PAGE, count = POPULAR_FEED_COUNT);
        let url = self.endpoint(&["feed"])?;
        let result = self
            .get_json(
                url,
                &[
                    ("type", "popular".to_string()),
                    ("page", POPULAR_FEED_PAGE.to_string()),
                    ("count", POPULAR_FEED_COUNT.to_string()),
                ],
            )
            .await;
        log_api_result!("popular_tracks", result);
        result
    }

    pub async fn artist(&self, permalink: &str) -> Result<ArtistResponse> {
        log_api_request!("artist", permalink = %permalink);
        let url = self.endpoint(&[permalink])?;
        let result = self.get_json(url, &[]).await;
        log_api_result!("artist", result);
        result
    }

    pub async fn artist_tracks(&self, permalink: &str) -> Result<Vec<TrackResponse>> {
        log_api_request!("artist_tracks", permalink = %permalink);
        let url = self.endpoint(&[permalink, ""])?;
        let result = self
            .get_json(
                url,
                &[
                    ("type", "tracks".to_string()),
                    ("page", ARTIST_TRACKS_PAGE.to_string()),
                    ("count", ARTIST_TRACKS_COUNT.to_string()),
                ],
            )
            .await;
        log_api_result!("artist_tracks", result);
        result
    }

    /// Popular feed joined with each owner's profile
    pub async fn popular_artists(&self) -> Result<Vec<PopularArtist>> {
        let tracks = self.popular_tracks().await?;
        let owners = unique_owners(&tracks);

        let profiles = try_join_all(owners.iter().map(|track| self.artist(&track.user.permalink)))
            .await?;

        Ok(owners
            .iter()
            .zip(profiles.iter())
            .map(|(track, artist)| PopularArtist::new(artist, track))
            .collect())
    }

    pub async fn artist_streamables(&self, permalink: &str) -> Result<Vec<Streamable>> {
        let tracks = self.artist_tracks(permalink).await?;
        Ok(tracks.iter().map(Streamable::from).collect())
    }
}
