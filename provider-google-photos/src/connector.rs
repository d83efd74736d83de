//! Google Photos shared-album connector
//!
//! Implements the `AlbumSource` trait on top of the fetch client, the page
//! extraction strategy and the media resolver.

use std::sync::Arc;

use async_trait::async_trait;
use bridge_traits::album::{AlbumRecord, AlbumSource, MediaProbe, ResolvedMedia};
use bridge_traits::error::Result;
use bridge_traits::http::HttpClient;
use bridge_traits::time::{Clock, SystemClock};
use tracing::{info, instrument};

use crate::error::GooglePhotosError;
use crate::extractor::{PageToAlbum, SharedAlbumPageV1};
use crate::fetch::{FetchPolicy, ResilientFetchClient};
use crate::resolver::MediaResolver;

/// Google Photos shared-album connector
///
/// # Example
///
/// ```ignore
/// use provider_google_photos::GooglePhotosConnector;
/// use bridge_traits::album::AlbumSource;
///
/// let connector = GooglePhotosConnector::new(http_client);
/// let album = connector.scrape_album("https://photos.app.goo.gl/abc").await?;
/// ```
pub struct GooglePhotosConnector {
    fetch: Arc<ResilientFetchClient>,
    resolver: MediaResolver,
    strategy: Box<dyn PageToAlbum>,
}

impl GooglePhotosConnector {
    /// Connector with default pacing, the current page strategy and the system clock
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self::with_parts(
            http_client,
            FetchPolicy::default(),
            Arc::new(SystemClock),
        )
    }

    pub fn with_parts(
        http_client: Arc<dyn HttpClient>,
        policy: FetchPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let fetch = Arc::new(ResilientFetchClient::with_policy(http_client, policy));
        Self {
            resolver: MediaResolver::new(Arc::clone(&fetch)),
            fetch,
            strategy: Box::new(SharedAlbumPageV1::new(clock)),
        }
    }

    /// Swap the page extraction strategy
    pub fn with_strategy(mut self, strategy: Box<dyn PageToAlbum>) -> Self {
        self.strategy = strategy;
        self
    }

    async fn scrape(&self, url: &str) -> crate::Result<AlbumRecord> {
        let response = self.fetch.get(url).await?;
        if response.status != 200 {
            return Err(GooglePhotosError::PageStatus {
                status: response.status,
            });
        }

        let html = String::from_utf8_lossy(&response.body);
        let album = self.strategy.extract(&html, url)?;

        info!(
            title = %album.title,
            items = album.items.len(),
            strategy = self.strategy.version(),
            "Scraped shared album"
        );
        Ok(album)
    }
}

#[async_trait]
impl AlbumSource for GooglePhotosConnector {
    #[instrument(skip(self))]
    async fn scrape_album(&self, url: &str) -> Result<AlbumRecord> {
        Ok(self.scrape(url).await?)
    }

    async fn probe_media(&self, source_url: &str) -> Result<MediaProbe> {
        Ok(self.resolver.probe(source_url).await?)
    }

    async fn fetch_media(&self, source_url: &str, probe: &MediaProbe) -> Result<ResolvedMedia> {
        Ok(self.resolver.download(source_url, probe).await?)
    }
}
