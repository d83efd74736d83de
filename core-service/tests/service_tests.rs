//! Service-level tests: startup checks and bootstrap validation

use async_trait::async_trait;
use bridge_traits::album::{AlbumRecord, AlbumSource, MediaProbe, ResolvedMedia};
use bridge_traits::destination::{
    AssetDestination, DestinationAlbum, DestinationAsset, DestinationUser, UploadReceipt,
    UploadRequest,
};
use bridge_traits::error::{BridgeError, Result};
use core_runtime::config::AppConfig;
use core_runtime::events::{CoreEvent, ServiceEvent};
use core_service::{bootstrap, CoreDependencies, CoreError, CoreService};
use mockall::mock;
use std::sync::Arc;

mock! {
    Source {}

    #[async_trait]
    impl AlbumSource for Source {
        async fn scrape_album(&self, url: &str) -> Result<AlbumRecord>;
        async fn probe_media(&self, source_url: &str) -> Result<MediaProbe>;
        async fn fetch_media(&self, source_url: &str, probe: &MediaProbe) -> Result<ResolvedMedia>;
    }
}

mock! {
    Destination {}

    #[async_trait]
    impl AssetDestination for Destination {
        async fn get_current_user(&self) -> Result<DestinationUser>;
        async fn list_albums(&self) -> Result<Vec<DestinationAlbum>>;
        async fn create_album(&self, name: &str) -> Result<DestinationAlbum>;
        async fn get_album_assets(&self, album_id: &str) -> Result<Vec<DestinationAsset>>;
        async fn upload_asset(&self, request: UploadRequest) -> Result<UploadReceipt>;
        async fn add_assets_to_album(&self, album_id: &str, asset_ids: &[String]) -> Result<()>;
    }
}

fn config(albums: &[&str]) -> AppConfig {
    let mut raw = String::from(
        r#"
        album_concurrency = 2

        [destination]
        api_url = "https://immich.example"
        api_key = "key"
        "#,
    );
    for url in albums {
        raw.push_str(&format!("\n[[albums]]\nurl = \"{}\"\n", url));
    }
    AppConfig::from_toml_str(&raw).unwrap()
}

fn user() -> DestinationUser {
    DestinationUser {
        id: "u1".to_string(),
        name: "Alex".to_string(),
    }
}

#[tokio::test]
async fn test_connectivity_failure_is_fatal() {
    let mut source = MockSource::new();
    source.expect_scrape_album().times(0);
    let mut destination = MockDestination::new();
    destination
        .expect_get_current_user()
        .times(1)
        .returning(|| Err(BridgeError::Upload("HTTP 401: Invalid API key".to_string())));

    let service = CoreService::new(
        config(&["https://photos.app.goo.gl/a"]),
        CoreDependencies::new(Arc::new(source), Arc::new(destination)),
    );

    let err = service.run_once().await.unwrap_err();
    assert!(matches!(err, CoreError::Connectivity(_)));
}

#[tokio::test]
async fn test_run_once_reports_each_album() {
    let mut source = MockSource::new();
    source.expect_scrape_album().times(2).returning(|url| {
        if url.ends_with("/broken") {
            Err(BridgeError::Extraction("ds:1 anchor not found".to_string()))
        } else {
            Ok(AlbumRecord {
                source_identifier: url.to_string(),
                title: "Empty".to_string(),
                items: vec![],
            })
        }
    });
    let mut destination = MockDestination::new();
    destination.expect_get_current_user().times(1).returning(|| Ok(user()));

    let service = CoreService::new(
        config(&["https://photos.app.goo.gl/ok", "https://photos.app.goo.gl/broken"]),
        CoreDependencies::new(Arc::new(source), Arc::new(destination)),
    );
    let mut events = service.event_bus().subscribe();

    let results = service.run_once().await.unwrap();

    assert_eq!(results.len(), 2);
    assert!(results[0].as_ref().unwrap().is_empty());
    assert!(results[1].is_err());
    assert!(matches!(
        events.recv().await.unwrap(),
        CoreEvent::Service(ServiceEvent::Connected { user_id, .. }) if user_id == "u1"
    ));
}

#[test]
fn test_bootstrap_validates_config() {
    let mut invalid = config(&["https://photos.app.goo.gl/a"]);
    invalid.destination.api_url = "immich.example".to_string();

    assert!(matches!(bootstrap(invalid), Err(CoreError::Config(_))));
}

#[test]
fn test_bootstrap_builds_service() {
    let service = bootstrap(config(&["https://photos.app.goo.gl/a"])).unwrap();

    assert_eq!(service.config().albums.len(), 1);
    assert_eq!(service.config().album_concurrency, 2);
}
