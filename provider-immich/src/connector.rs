//! Immich API connector implementation
//!
//! Implements the `AssetDestination` trait for the Immich REST API.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bridge_traits::destination::{
    AssetDestination, DestinationAlbum, DestinationAsset, DestinationUser, UploadReceipt,
    UploadRequest,
};
use bridge_traits::error::Result;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, MultipartForm};
use chrono::{SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

use crate::error::ImmichError;
use crate::types::{
    AlbumResponse, BulkIdResponse, BulkIdsRequest, CreateAlbumRequest, UpdateAssetRequest,
    UploadResponse, UserResponse,
};

/// `deviceId` reported for every upload
pub const DEVICE_ID: &str = "album-sync";

/// Content type used when the media type is unknown
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Immich API connector
///
/// # Example
///
/// ```ignore
/// use provider_immich::ImmichConnector;
/// use bridge_traits::destination::AssetDestination;
///
/// let immich = ImmichConnector::new(http_client, "https://immich.local", api_key);
/// let user = immich.get_current_user().await?;
/// ```
pub struct ImmichConnector {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl fmt::Debug for ImmichConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImmichConnector")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ImmichConnector {
    /// Create a connector for the server at `base_url` (trailing `/` ignored).
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http_client,
            base_url,
            api_key: api_key.into(),
            timeout: Duration::from_secs(300),
        }
    }

    /// Per-request ceiling; uploads of large videos need a generous one.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: HttpMethod, path: &str) -> HttpRequest {
        HttpRequest::new(method, format!("{}/api{}", self.base_url, path))
            .header("x-api-key", self.api_key.as_str())
            .header("Accept", "application/json")
            .timeout(self.timeout)
    }

    async fn send(&self, request: HttpRequest) -> crate::Result<HttpResponse> {
        let response = self.http_client.execute(request).await?;

        if !response.is_success() {
            let body = String::from_utf8_lossy(&response.body).into_owned();
            warn!(status = response.status, body = %body, "Immich request failed");
            return Err(ImmichError::Api {
                status: response.status,
                body,
            });
        }

        Ok(response)
    }

    fn parse<T: DeserializeOwned>(response: &HttpResponse) -> crate::Result<T> {
        serde_json::from_slice(&response.body).map_err(|e| ImmichError::Parse(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> crate::Result<T> {
        let response = self.send(self.request(HttpMethod::Get, path)).await?;
        Self::parse(&response)
    }

    fn upload_form(request: &UploadRequest) -> MultipartForm {
        let timestamp = request
            .taken_at
            .unwrap_or_else(Utc::now)
            .to_rfc3339_opts(SecondsFormat::Millis, true);
        let content_type = if request.content_type.is_empty() {
            FALLBACK_CONTENT_TYPE
        } else {
            request.content_type.as_str()
        };

        MultipartForm::new()
            .text("deviceAssetId", request.filename.as_str())
            .text("deviceId", DEVICE_ID)
            .text("fileCreatedAt", timestamp.as_str())
            .text("fileModifiedAt", timestamp.as_str())
            .text("isFavorite", "false")
            .file(
                "assetData",
                request.filename.as_str(),
                content_type,
                request.bytes.clone(),
            )
    }

    async fn upload(&self, request: UploadRequest) -> crate::Result<UploadReceipt> {
        let form = Self::upload_form(&request);
        let response = self
            .send(self.request(HttpMethod::Post, "/assets").multipart(form))
            .await?;
        let uploaded: UploadResponse = Self::parse(&response)?;

        if uploaded.id.is_empty() {
            return Err(ImmichError::EmptyAssetId {
                filename: request.filename,
            });
        }

        let is_duplicate = uploaded.is_duplicate();
        if !is_duplicate {
            if let Some(description) = request.description.as_deref().filter(|d| !d.is_empty()) {
                self.set_description(&uploaded.id, description).await;
            }
        }

        debug!(
            filename = %request.filename,
            asset_id = %uploaded.id,
            size = request.size_bytes,
            is_duplicate,
            "Uploaded asset"
        );

        Ok(UploadReceipt {
            asset_id: uploaded.id,
            is_duplicate,
        })
    }

    /// Best effort; the asset already exists either way.
    async fn set_description(&self, asset_id: &str, description: &str) {
        let request = match self
            .request(HttpMethod::Put, &format!("/assets/{}", asset_id))
            .json(&UpdateAssetRequest { description })
        {
            Ok(request) => request,
            Err(e) => {
                warn!(asset_id, error = %e, "Could not encode description update");
                return;
            }
        };

        if let Err(e) = self.send(request).await {
            warn!(asset_id, error = %e, "Failed to set asset description");
        }
    }
}

#[async_trait]
impl AssetDestination for ImmichConnector {
    #[instrument(skip(self))]
    async fn get_current_user(&self) -> Result<DestinationUser> {
        let user: UserResponse = self.get_json("/users/me").await?;
        Ok(DestinationUser {
            id: user.id,
            name: user.name,
        })
    }

    #[instrument(skip(self))]
    async fn list_albums(&self) -> Result<Vec<DestinationAlbum>> {
        let albums: Vec<AlbumResponse> = self.get_json("/albums").await?;
        debug!(count = albums.len(), "Listed albums");
        Ok(albums
            .into_iter()
            .map(|album| DestinationAlbum {
                id: album.id,
                name: album.album_name,
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn create_album(&self, name: &str) -> Result<DestinationAlbum> {
        let request = self
            .request(HttpMethod::Post, "/albums")
            .json(&CreateAlbumRequest { album_name: name })?;
        let response = self.send(request).await?;
        let album: AlbumResponse = Self::parse(&response)?;

        info!(album_id = %album.id, name = %album.album_name, "Created album");
        Ok(DestinationAlbum {
            id: album.id,
            name: album.album_name,
        })
    }

    #[instrument(skip(self))]
    async fn get_album_assets(&self, album_id: &str) -> Result<Vec<DestinationAsset>> {
        let album: AlbumResponse = self.get_json(&format!("/albums/{}", album_id)).await?;
        Ok(album
            .assets
            .into_iter()
            .map(|asset| DestinationAsset {
                id: asset.id,
                original_file_name: asset.original_file_name,
            })
            .collect())
    }

    #[instrument(skip(self, request), fields(filename = %request.filename))]
    async fn upload_asset(&self, request: UploadRequest) -> Result<UploadReceipt> {
        Ok(self.upload(request).await?)
    }

    #[instrument(skip(self, asset_ids), fields(count = asset_ids.len()))]
    async fn add_assets_to_album(&self, album_id: &str, asset_ids: &[String]) -> Result<()> {
        if asset_ids.is_empty() {
            return Ok(());
        }

        let request = self
            .request(HttpMethod::Put, &format!("/albums/{}/assets", album_id))
            .json(&BulkIdsRequest { ids: asset_ids })?;
        let response = self.send(request).await?;

        // Some server versions answer with an empty body
        if !response.body.is_empty() {
            let results: Vec<BulkIdResponse> = Self::parse(&response)?;
            for rejected in results.iter().filter(|r| !r.is_effective()) {
                warn!(
                    asset_id = %rejected.id,
                    error = rejected.error.as_deref().unwrap_or("unknown"),
                    "Asset was not added to album"
                );
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use chrono::TimeZone;

    #[test]
    fn test_base_url_trailing_slash() {
        let connector = ImmichConnector::new(
            Arc::new(NoopClient),
            "https://immich.local/",
            "key",
        );
        assert_eq!(connector.base_url(), "https://immich.local");

        let request = connector.request(HttpMethod::Get, "/users/me");
        assert_eq!(request.url, "https://immich.local/api/users/me");
        assert_eq!(request.headers.get("x-api-key"), Some(&"key".to_string()));
        assert_eq!(request.timeout, Some(Duration::from_secs(300)));
    }

    #[test]
    fn test_debug_redacts_key() {
        let connector = ImmichConnector::new(Arc::new(NoopClient), "https://immich.local", "s3cret");
        let rendered = format!("{:?}", connector);
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn test_upload_form_fields() {
        let taken_at = Utc.with_ymd_and_hms(2023, 11, 14, 22, 13, 20).unwrap();
        let request = UploadRequest {
            bytes: Bytes::from_static(b"jpeg"),
            filename: "gp_abc.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            size_bytes: 4,
            taken_at: Some(taken_at),
            description: None,
        };

        let form = ImmichConnector::upload_form(&request);

        assert_eq!(form.text_value("deviceAssetId"), Some("gp_abc.jpg"));
        assert_eq!(form.text_value("deviceId"), Some(DEVICE_ID));
        assert_eq!(form.text_value("fileCreatedAt"), Some("2023-11-14T22:13:20.000Z"));
        assert_eq!(form.text_value("fileModifiedAt"), Some("2023-11-14T22:13:20.000Z"));
        assert_eq!(form.parts.len(), 6);
    }

    struct NoopClient;

    #[async_trait]
    impl HttpClient for NoopClient {
        async fn execute(&self, _request: HttpRequest) -> Result<HttpResponse> {
            Err(bridge_traits::BridgeError::NotAvailable("noop".to_string()))
        }
    }
}
