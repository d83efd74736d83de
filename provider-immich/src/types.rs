//! Immich API request and response types
//!
//! Only the fields the sync pipeline reads are modeled; everything else in
//! the responses is ignored.

use serde::{Deserialize, Serialize};

/// `GET /api/users/me`
#[derive(Debug, Clone, Deserialize)]
pub struct UserResponse {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Asset as embedded in an album response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetResponse {
    pub id: String,
    #[serde(default)]
    pub original_file_name: String,
}

/// `GET /api/albums`, `GET /api/albums/{id}`, `POST /api/albums`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumResponse {
    pub id: String,
    pub album_name: String,
    /// Absent from list responses
    #[serde(default)]
    pub assets: Vec<AssetResponse>,
}

/// `POST /api/albums` body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAlbumRequest<'a> {
    pub album_name: &'a str,
}

/// `POST /api/assets` response
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub id: String,
    /// `created`, `replaced` or `duplicate`
    #[serde(default)]
    pub status: String,
}

impl UploadResponse {
    pub fn is_duplicate(&self) -> bool {
        self.status.eq_ignore_ascii_case("duplicate")
    }
}

/// `PUT /api/assets/{id}` body
#[derive(Debug, Serialize)]
pub struct UpdateAssetRequest<'a> {
    pub description: &'a str,
}

/// `PUT /api/albums/{id}/assets` body
#[derive(Debug, Serialize)]
pub struct BulkIdsRequest<'a> {
    pub ids: &'a [String],
}

/// One entry of a bulk membership response
#[derive(Debug, Clone, Deserialize)]
pub struct BulkIdResponse {
    pub id: String,
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

impl BulkIdResponse {
    /// Already-present members are reported as a `duplicate` error.
    pub fn is_effective(&self) -> bool {
        self.success || self.error.as_deref() == Some("duplicate")
    }
}
