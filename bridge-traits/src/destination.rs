//! Destination Asset Service Abstractions
//!
//! The narrow interface the sync pipeline consumes from the asset-management
//! service that receives synced media.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Account the destination credentials belong to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationUser {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationAlbum {
    pub id: String,
    pub name: String,
}

/// Asset as listed inside a destination album
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationAsset {
    pub id: String,
    pub original_file_name: String,
}

/// Everything needed to create one asset
#[derive(Debug, Clone, PartialEq)]
pub struct UploadRequest {
    pub bytes: Bytes,
    pub filename: String,
    pub content_type: String,
    pub size_bytes: u64,
    /// `None` lets the destination fall back to the upload time
    pub taken_at: Option<DateTime<Utc>>,
    pub description: Option<String>,
}

/// Result of an upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub asset_id: String,
    /// The destination already held identical content under another asset
    pub is_duplicate: bool,
}

/// Asset-management service that receives synced media
///
/// # Example
///
/// ```ignore
/// use bridge_traits::destination::AssetDestination;
///
/// async fn check(dest: &dyn AssetDestination) -> Result<()> {
///     let user = dest.get_current_user().await?;
///     println!("connected as {}", user.name);
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait AssetDestination: Send + Sync {
    /// Connectivity and credential check
    async fn get_current_user(&self) -> Result<DestinationUser>;

    async fn list_albums(&self) -> Result<Vec<DestinationAlbum>>;

    async fn create_album(&self, name: &str) -> Result<DestinationAlbum>;

    /// Current members of an album
    async fn get_album_assets(&self, album_id: &str) -> Result<Vec<DestinationAsset>>;

    async fn upload_asset(&self, request: UploadRequest) -> Result<UploadReceipt>;

    /// Add assets to an album. Ids that are already members are not an error.
    async fn add_assets_to_album(&self, album_id: &str, asset_ids: &[String]) -> Result<()>;
}
