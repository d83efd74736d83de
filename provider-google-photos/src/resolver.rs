//! Media resolution
//!
//! Item URLs need a quality selector before they serve anything: `=d` returns
//! the original image (motion photos included), `=dv` the original video. The
//! type is only known after a HEAD probe.

use std::sync::Arc;

use bridge_traits::album::{MediaProbe, ResolvedMedia};
use tracing::{debug, instrument};

use crate::error::{ResolveError, Result};
use crate::fetch::ResilientFetchClient;

/// Original-quality selector for images, also used for the type probe
pub const IMAGE_SUFFIX: &str = "=d";

/// Original-quality selector for videos
pub const VIDEO_SUFFIX: &str = "=dv";

/// Downloads original-quality media for album items
pub struct MediaResolver {
    fetch: Arc<ResilientFetchClient>,
}

impl MediaResolver {
    pub fn new(fetch: Arc<ResilientFetchClient>) -> Self {
        Self { fetch }
    }

    /// Read the declared content type without transferring the body.
    #[instrument(skip(self))]
    pub async fn probe(&self, source_url: &str) -> Result<MediaProbe> {
        let url = format!("{}{}", source_url, IMAGE_SUFFIX);
        let response = self.fetch.head(&url).await?;

        if !response.is_success() {
            return Err(ResolveError::ProbeStatus {
                url,
                status: response.status,
            }
            .into());
        }

        let content_type = response.header("Content-Type").unwrap_or_default().to_string();
        let is_video = is_video_type(&content_type);
        debug!(content_type = %content_type, is_video, "Probed media type");

        Ok(MediaProbe {
            content_type,
            is_video,
        })
    }

    /// Download and fully buffer an item whose type is known.
    ///
    /// The body is buffered because the host may use chunked transfer and the
    /// destination needs an exact size up front.
    #[instrument(skip(self, probe), fields(is_video = probe.is_video))]
    pub async fn download(&self, source_url: &str, probe: &MediaProbe) -> Result<ResolvedMedia> {
        let (suffix, kind) = if probe.is_video {
            (VIDEO_SUFFIX, "video")
        } else {
            (IMAGE_SUFFIX, "image")
        };

        let response = self.fetch.get(&format!("{}{}", source_url, suffix)).await?;
        if response.status != 200 {
            return Err(ResolveError::DownloadStatus {
                kind,
                status: response.status,
            }
            .into());
        }

        let content_type = response
            .header("Content-Type")
            .map(str::to_string)
            .unwrap_or_else(|| probe.content_type.clone());
        let extension = extension_for_content_type(&content_type).to_string();
        let bytes = response.body;

        debug!(size = bytes.len(), extension = %extension, "Downloaded media");

        Ok(ResolvedMedia {
            size_bytes: bytes.len() as u64,
            bytes,
            extension,
            content_type,
            is_video: probe.is_video,
        })
    }

    /// Probe then download.
    pub async fn resolve(&self, source_url: &str) -> Result<ResolvedMedia> {
        let probe = self.probe(source_url).await?;
        self.download(source_url, &probe).await
    }
}

fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Whether a declared content type is a video type
pub fn is_video_type(content_type: &str) -> bool {
    media_type(content_type).starts_with("video/")
}

/// File extension, with leading dot, for a declared content type.
///
/// Unknown video types map to `.mp4`, anything else unknown to `.jpg`.
pub fn extension_for_content_type(content_type: &str) -> &'static str {
    let media_type = media_type(content_type);
    match media_type.as_str() {
        "image/jpeg" => ".jpg",
        "image/png" => ".png",
        "image/gif" => ".gif",
        "image/webp" => ".webp",
        "image/heic" | "image/heif" => ".heic",
        "image/avif" => ".avif",
        "video/mp4" => ".mp4",
        "video/webm" => ".webm",
        "video/quicktime" => ".mov",
        "video/x-matroska" => ".mkv",
        other if other.starts_with("video/") => ".mp4",
        _ => ".jpg",
    }
}
