//! # Album Sync Coordinator
//!
//! Runs one pass for one configured album.
//!
//! ## Workflow
//!
//! 1. Scrape the shared album page
//! 2. Pick the destination title (configured override or scraped title)
//! 3. Resolve the destination album: pinned id, name match, or create
//! 4. Index the destination album's current members by basename
//! 5. Reconcile items through the worker pool
//! 6. Publish completion and log the counts
//!
//! A failed scrape aborts only this album's pass. Destination album lookup
//! failures degrade: items are still uploaded, just not grouped.

use crate::naming::{build_index, AssetIndex};
use crate::outcome::PassSummary;
use crate::reconciler::Reconciler;
use crate::{job::SyncJobId, Result, SyncError};
use async_trait::async_trait;
use bridge_traits::album::AlbumSource;
use bridge_traits::destination::AssetDestination;
use core_runtime::config::{AlbumConfig, AppConfig};
use core_runtime::events::{CoreEvent, EventBus, SyncEvent};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

/// Sync coordinator configuration
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Concurrent transfers within one album pass
    pub workers: usize,

    /// Skip items without a capture timestamp instead of uploading them
    /// with the current time
    pub strict_metadata: bool,

    /// Skip items the media probe reports as video
    pub skip_videos: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            strict_metadata: false,
            skip_videos: false,
        }
    }
}

impl From<&AppConfig> for SyncConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            workers: config.workers.max(1),
            strict_metadata: config.strict_metadata,
            skip_videos: config.skip_videos,
        }
    }
}

/// One pass over one album; the scheduler's seam.
#[async_trait]
pub trait AlbumPass: Send + Sync {
    async fn sync_album(&self, album: &AlbumConfig) -> Result<PassSummary>;
}

/// Coordinates a single album pass from scrape to membership update.
pub struct AlbumSyncCoordinator {
    source: Arc<dyn AlbumSource>,
    destination: Arc<dyn AssetDestination>,
    event_bus: EventBus,
    reconciler: Reconciler,
}

impl AlbumSyncCoordinator {
    pub fn new(
        source: Arc<dyn AlbumSource>,
        destination: Arc<dyn AssetDestination>,
        event_bus: EventBus,
        config: SyncConfig,
    ) -> Self {
        let reconciler = Reconciler::new(Arc::clone(&source), Arc::clone(&destination), config);
        Self {
            source,
            destination,
            event_bus,
            reconciler,
        }
    }

    /// Pinned id, else the first album named `title`, else a new album.
    async fn resolve_album_id(&self, title: &str, pinned: Option<&str>) -> Option<String> {
        if let Some(id) = pinned.filter(|id| !id.is_empty()) {
            return Some(id.to_string());
        }

        match self.destination.list_albums().await {
            Ok(albums) => {
                if let Some(found) = albums.into_iter().find(|a| a.name == title) {
                    debug!(album_id = %found.id, "Matched existing album");
                    return Some(found.id);
                }
            }
            Err(e) => warn!(error = %e, "Failed to list albums"),
        }

        info!(title, "Creating album");
        match self.destination.create_album(title).await {
            Ok(album) => Some(album.id),
            Err(e) => {
                error!(error = %e, "Error creating album");
                None
            }
        }
    }

    async fn load_index(&self, album_id: Option<&str>) -> AssetIndex {
        let Some(album_id) = album_id else {
            return AssetIndex::new();
        };

        match self.destination.get_album_assets(album_id).await {
            Ok(assets) => {
                let index = build_index(&assets);
                debug!(count = index.len(), "Pre-fetched album assets");
                index
            }
            Err(e) => {
                warn!(album_id, error = %e, "Failed to fetch album assets");
                AssetIndex::new()
            }
        }
    }

    fn emit(&self, event: SyncEvent) {
        // No subscribers is fine
        self.event_bus.emit(CoreEvent::Sync(event)).ok();
    }

    fn emit_phase(&self, job_id: SyncJobId, phase: &str, processed: u64, total: Option<u64>) {
        self.emit(SyncEvent::Progress {
            job_id: job_id.to_string(),
            items_processed: processed,
            total_items: total,
            phase: phase.to_string(),
        });
    }
}

#[async_trait]
impl AlbumPass for AlbumSyncCoordinator {
    #[instrument(skip(self, album), fields(album_url = %album.url))]
    async fn sync_album(&self, album: &AlbumConfig) -> Result<PassSummary> {
        let job_id = SyncJobId::new();
        let started = Instant::now();
        info!(%job_id, "Syncing shared album");
        self.emit(SyncEvent::Started {
            job_id: job_id.to_string(),
            album_url: album.url.clone(),
        });

        let record = match self.source.scrape_album(&album.url).await {
            Ok(record) => record,
            Err(source) => {
                self.emit(SyncEvent::Failed {
                    job_id: job_id.to_string(),
                    album_url: album.url.clone(),
                    message: source.to_string(),
                });
                return Err(SyncError::Source {
                    url: album.url.clone(),
                    source,
                });
            }
        };

        let title = album
            .album_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(record.title.as_str())
            .to_string();
        info!(count = record.items.len(), title = %title, "Found photos in album");

        let total = record.items.len() as u64;
        let summary = if record.is_empty() {
            info!("No photos found, skipping");
            PassSummary::default()
        } else {
            self.emit_phase(job_id, "Resolving album", 0, Some(total));
            let album_id = self
                .resolve_album_id(&title, album.existing_album_id.as_deref())
                .await;
            let index = self.load_index(album_id.as_deref()).await;

            self.emit_phase(job_id, "Transferring", 0, Some(total));
            self.reconciler
                .reconcile(&record, &title, index, album_id.as_deref())
                .await
        };

        info!(
            title = %title,
            added = summary.added,
            skipped = summary.skipped,
            deduplicated = summary.deduplicated,
            failed = summary.failed,
            total = summary.total,
            "Sync finished"
        );
        self.emit(SyncEvent::Completed {
            job_id: job_id.to_string(),
            album_url: album.url.clone(),
            title,
            added: summary.added,
            skipped: summary.skipped,
            failed: summary.failed,
            deduplicated: summary.deduplicated,
            total: summary.total,
            duration_secs: started.elapsed().as_secs(),
        });

        Ok(summary)
    }
}
