//! Shared Album Source Abstractions
//!
//! Data model for a scraped album and the trait the sync pipeline uses to
//! read albums and their media from the hosting service.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One item inside a shared album
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRecord {
    /// Opaque, case-sensitive identifier. May contain `/` and `:`.
    pub item_id: String,
    /// Base URL; needs a quality-selector suffix before it can be fetched.
    /// Never empty.
    pub source_url: String,
    pub width: u32,
    pub height: u32,
    /// Capture time, when the page carried a plausible one
    pub taken_at: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub uploader_name: Option<String>,
}

/// Result of scraping one shared album page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumRecord {
    /// The album URL, used as an opaque identity key
    pub source_identifier: String,
    pub title: String,
    pub items: Vec<MediaRecord>,
}

impl AlbumRecord {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

/// Declared type of a media item, read without transferring its body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaProbe {
    pub content_type: String,
    pub is_video: bool,
}

/// Fully buffered original-quality media
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMedia {
    pub bytes: Bytes,
    pub size_bytes: u64,
    /// Extension including the leading dot, e.g. `.jpg`
    pub extension: String,
    pub content_type: String,
    pub is_video: bool,
}

/// Source of shared albums
///
/// Implementations handle throttling and anti-bot pacing internally; callers
/// only see final results.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::album::AlbumSource;
///
/// async fn count_items(source: &dyn AlbumSource, url: &str) -> Result<usize> {
///     let album = source.scrape_album(url).await?;
///     Ok(album.len())
/// }
/// ```
#[async_trait]
pub trait AlbumSource: Send + Sync {
    /// Fetch and extract the album page at `url`.
    ///
    /// # Errors
    ///
    /// [`BridgeError::Extraction`](crate::BridgeError::Extraction) when the page
    /// structure is not recognized, [`BridgeError::Transport`](crate::BridgeError::Transport)
    /// when the page could not be fetched.
    async fn scrape_album(&self, url: &str) -> Result<AlbumRecord>;

    /// Read the declared content type of an item without downloading it.
    async fn probe_media(&self, source_url: &str) -> Result<MediaProbe>;

    /// Download an item whose type was already probed.
    async fn fetch_media(&self, source_url: &str, probe: &MediaProbe) -> Result<ResolvedMedia>;

    /// Probe then download in one step.
    async fn resolve_media(&self, source_url: &str) -> Result<ResolvedMedia> {
        let probe = self.probe_media(source_url).await?;
        self.fetch_media(source_url, &probe).await
    }
}
