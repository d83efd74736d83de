//! # Reconciler
//!
//! Transfers the items of one scraped album that the destination album does
//! not have yet.
//!
//! Items are fanned out to a fixed pool of tokio tasks pulling from a shared
//! queue. Every item yields exactly one [`SyncOutcome`]; the pass waits for
//! all workers before it reads the outcomes, then adds every uploaded or
//! deduplicated asset to the destination album in one batch.

use crate::coordinator::SyncConfig;
use crate::naming::{basename, compose_description, AssetIndex};
use crate::outcome::{PassSummary, SkipReason, SyncOutcome};
use bridge_traits::album::{AlbumRecord, AlbumSource, MediaRecord};
use bridge_traits::destination::{AssetDestination, UploadRequest};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, instrument, warn};

/// Runs the per-item pipeline over a worker pool.
pub struct Reconciler {
    source: Arc<dyn AlbumSource>,
    destination: Arc<dyn AssetDestination>,
    config: SyncConfig,
}

/// Read-only state every worker shares for one pass
struct ItemWorker {
    source: Arc<dyn AlbumSource>,
    destination: Arc<dyn AssetDestination>,
    index: AssetIndex,
    album_title: String,
    album_url: String,
    strict_metadata: bool,
    skip_videos: bool,
}

impl Reconciler {
    pub fn new(
        source: Arc<dyn AlbumSource>,
        destination: Arc<dyn AssetDestination>,
        config: SyncConfig,
    ) -> Self {
        Self {
            source,
            destination,
            config,
        }
    }

    /// Pool size for `item_count` items: the configured worker count
    /// clamped to `[1, item_count]`.
    pub fn pool_size(&self, item_count: usize) -> usize {
        self.config.workers.clamp(1, item_count.max(1))
    }

    /// Transfer `album` into the destination.
    ///
    /// `title` is the destination-facing album title. `album_id` is `None`
    /// when no destination album could be resolved; items are still
    /// uploaded but not added to any album.
    #[instrument(skip(self, album, index), fields(album_url = %album.source_identifier, items = album.items.len()))]
    pub async fn reconcile(
        &self,
        album: &AlbumRecord,
        title: &str,
        index: AssetIndex,
        album_id: Option<&str>,
    ) -> PassSummary {
        let total = album.items.len();
        if total == 0 {
            return PassSummary::default();
        }

        let workers = self.pool_size(total);
        info!(total_items = total, workers, "Processing items");

        let worker = Arc::new(ItemWorker {
            source: Arc::clone(&self.source),
            destination: Arc::clone(&self.destination),
            index,
            album_title: title.to_string(),
            album_url: album.source_identifier.clone(),
            strict_metadata: self.config.strict_metadata,
            skip_videos: self.config.skip_videos,
        });

        // Both channels hold every item, so nothing blocks before the barrier
        let (job_tx, job_rx) = mpsc::channel::<MediaRecord>(total);
        let job_rx = Arc::new(Mutex::new(job_rx));
        let (result_tx, mut result_rx) = mpsc::channel::<SyncOutcome>(total);

        let mut handles = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            let job_rx = Arc::clone(&job_rx);
            let result_tx = result_tx.clone();
            let worker = Arc::clone(&worker);

            handles.push(tokio::spawn(async move {
                loop {
                    let next = job_rx.lock().await.recv().await;
                    let Some(item) = next else {
                        break;
                    };
                    let outcome = worker.process(&item).await;
                    if result_tx.send(outcome).await.is_err() {
                        break;
                    }
                }
                debug!(worker_id, "Worker finished");
            }));
        }
        drop(result_tx);

        for item in &album.items {
            if job_tx.send(item.clone()).await.is_err() {
                break;
            }
        }
        drop(job_tx);

        for handle in handles {
            if let Err(e) = handle.await {
                error!(error = %e, "Worker task failed");
            }
        }

        let mut summary = PassSummary::default();
        while let Some(outcome) = result_rx.recv().await {
            if let SyncOutcome::Failed(reason) = &outcome {
                error!(error = %reason, "Failed to process item");
            }
            summary.record(&outcome);
        }

        // A panicked worker drops its in-flight item; queued items stay unclaimed if all workers died
        let missing = (total as u64).saturating_sub(summary.total);
        if missing > 0 {
            error!(missing, "Items finished without an outcome");
            for _ in 0..missing {
                summary.record(&SyncOutcome::Failed(
                    "worker stopped before reporting an outcome".to_string(),
                ));
            }
        }

        if let Some(album_id) = album_id {
            self.add_members(album_id, title, &summary.member_ids).await;
        }

        summary
    }

    async fn add_members(&self, album_id: &str, title: &str, ids: &[String]) {
        if ids.is_empty() {
            return;
        }

        info!(count = ids.len(), album = %title, "Adding items to album");
        if let Err(e) = self.destination.add_assets_to_album(album_id, ids).await {
            error!(album_id, error = %e, "Error adding assets to album");
        }
    }
}

impl ItemWorker {
    async fn process(&self, item: &MediaRecord) -> SyncOutcome {
        let basename = basename(&item.item_id);

        if let Some(asset_id) = self.index.get(&basename) {
            debug!(asset_id = %asset_id, filename = %basename, "Asset already in album");
            return SyncOutcome::Skipped(SkipReason::AlreadyPresent);
        }

        if self.strict_metadata && item.taken_at.is_none() {
            warn!(
                item_id = %item.item_id,
                url = %item.source_url,
                "Skipping item with missing metadata date"
            );
            return SyncOutcome::Skipped(SkipReason::MissingMetadata);
        }

        debug!(item_id = %item.item_id, "Resolving item");
        let probe = match self.source.probe_media(&item.source_url).await {
            Ok(probe) => probe,
            Err(e) => return SyncOutcome::Failed(format!("error resolving {}: {}", basename, e)),
        };

        if probe.is_video && self.skip_videos {
            debug!(item_id = %item.item_id, "Skipping video item");
            return SyncOutcome::Skipped(SkipReason::FilteredVideo);
        }

        let media = match self.source.fetch_media(&item.source_url, &probe).await {
            Ok(media) => media,
            Err(e) => {
                return SyncOutcome::Failed(format!("error downloading {}: {}", basename, e))
            }
        };

        let filename = format!("{}{}", basename, media.extension);
        if item.taken_at.is_none() {
            warn!(
                filename = %filename,
                url = %item.source_url,
                is_video = media.is_video,
                "Uploading item with missing metadata date (using current time)"
            );
        }

        let description = compose_description(
            item.description.as_deref(),
            item.uploader_name.as_deref(),
            &self.album_title,
            &self.album_url,
        );

        let request = UploadRequest {
            bytes: media.bytes,
            filename: filename.clone(),
            content_type: media.content_type,
            size_bytes: media.size_bytes,
            taken_at: item.taken_at,
            description: Some(description),
        };

        match self.destination.upload_asset(request).await {
            Ok(receipt) if receipt.asset_id.is_empty() => {
                SyncOutcome::Failed(format!("upload returned empty ID for {}", filename))
            }
            Ok(receipt) if receipt.is_duplicate => {
                debug!(filename = %filename, asset_id = %receipt.asset_id, "Asset deduplicated by destination");
                SyncOutcome::Deduplicated(receipt.asset_id)
            }
            Ok(receipt) => {
                debug!(filename = %filename, asset_id = %receipt.asset_id, "Uploaded item");
                SyncOutcome::Uploaded(receipt.asset_id)
            }
            Err(e) => SyncOutcome::Failed(format!("error uploading {}: {}", filename, e)),
        }
    }
}
