//! Artwork download, required before a track may start playing

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use futures::future::BoxFuture;
use reqwest::header::CONTENT_TYPE;

/// Downloaded cover image, kept as the encoded bytes
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artwork {
    pub url: String,
    pub content_type: Option<String>,
    pub bytes: Arc<[u8]>,
}

impl Artwork {
    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }
}

pub trait ArtworkDownloader: Send + Sync {
    fn download<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Artwork>>;
}

#[derive(Clone)]
pub struct HttpArtworkDownloader {
    http: reqwest::Client,
}

impl HttpArtworkDownloader {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    async fn fetch(&self, url: &str) -> Result<Artwork> {
        if url.trim().is_empty() {
            bail!("Track has no artwork URL");
        }

        let response = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("Artwork request to {} failed", url))?
            .error_for_status()
            .context("Artwork host returned an error status")?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let bytes = response
            .bytes()
            .await
            .context("Failed to read artwork body")?;

        tracing::debug!(url = %url, size = bytes.len(), "Artwork downloaded");
        Ok(Artwork {
            url: url.to_string(),
            content_type,
            bytes: Arc::from(bytes.as_ref()),
        })
    }
}

impl ArtworkDownloader for HttpArtworkDownloader {
    fn download<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Artwork>> {
        Box::pin(self.fetch(url))
    }
}
