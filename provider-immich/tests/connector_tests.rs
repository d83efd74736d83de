use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bridge_traits::destination::{AssetDestination, UploadRequest};
use bridge_traits::error::{BridgeError, Result};
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, MultipartPart};
use bytes::Bytes;
use mockall::{mock, Sequence};
use provider_immich::ImmichConnector;

mock! {
    HttpClient {}

    #[async_trait]
    impl HttpClient for HttpClient {
        async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
    }
}

const BASE: &str = "https://immich.example";

fn json_response(status: u16, body: &'static str) -> HttpResponse {
    HttpResponse {
        status,
        headers: HashMap::new(),
        body: Bytes::from_static(body.as_bytes()),
    }
}

fn connector(mock_http: MockHttpClient) -> ImmichConnector {
    ImmichConnector::new(Arc::new(mock_http), BASE, "api-key-123")
}

fn upload_request(description: Option<&str>) -> UploadRequest {
    UploadRequest {
        bytes: Bytes::from_static(b"jpegdata"),
        filename: "gp_AF1Qip_abc_123.jpg".to_string(),
        content_type: "image/jpeg".to_string(),
        size_bytes: 8,
        taken_at: None,
        description: description.map(str::to_string),
    }
}

#[tokio::test]
async fn test_get_current_user() {
    let mut mock_http = MockHttpClient::new();
    mock_http
        .expect_execute()
        .withf(|req| {
            req.method == HttpMethod::Get
                && req.url == "https://immich.example/api/users/me"
                && req.headers.get("x-api-key").map(String::as_str) == Some("api-key-123")
        })
        .times(1)
        .returning(|_| Ok(json_response(200, r#"{"id":"u1","name":"Alex","email":"a@x"}"#)));

    let user = connector(mock_http).get_current_user().await.unwrap();

    assert_eq!(user.id, "u1");
    assert_eq!(user.name, "Alex");
}

#[tokio::test]
async fn test_unauthorized_is_upload_error() {
    let mut mock_http = MockHttpClient::new();
    mock_http
        .expect_execute()
        .times(1)
        .returning(|_| Ok(json_response(401, r#"{"message":"Invalid API key"}"#)));

    let err = connector(mock_http).get_current_user().await.unwrap_err();

    assert!(matches!(err, BridgeError::Upload(msg) if msg.contains("401")));
}

#[tokio::test]
async fn test_list_and_create_albums() {
    let mut mock_http = MockHttpClient::new();
    mock_http
        .expect_execute()
        .withf(|req| req.method == HttpMethod::Get && req.url.ends_with("/api/albums"))
        .times(1)
        .returning(|_| {
            Ok(json_response(
                200,
                r#"[{"id":"a1","albumName":"Ski Week"},{"id":"a2","albumName":"Other"}]"#,
            ))
        });
    mock_http
        .expect_execute()
        .withf(|req| {
            req.method == HttpMethod::Post
                && req.url.ends_with("/api/albums")
                && req.body.as_deref() == Some(br#"{"albumName":"New One"}"#.as_slice())
        })
        .times(1)
        .returning(|_| Ok(json_response(201, r#"{"id":"a3","albumName":"New One"}"#)));

    let immich = connector(mock_http);
    let albums = immich.list_albums().await.unwrap();
    let created = immich.create_album("New One").await.unwrap();

    assert_eq!(albums.len(), 2);
    assert_eq!(albums[0].name, "Ski Week");
    assert_eq!(created.id, "a3");
}

#[tokio::test]
async fn test_get_album_assets() {
    let mut mock_http = MockHttpClient::new();
    mock_http
        .expect_execute()
        .withf(|req| req.url == "https://immich.example/api/albums/a1")
        .times(1)
        .returning(|_| {
            Ok(json_response(
                200,
                r#"{"id":"a1","albumName":"Ski Week","assets":[
                    {"id":"x1","originalFileName":"gp_one.jpg","type":"IMAGE"},
                    {"id":"x2","originalFileName":"gp_two.mov","type":"VIDEO"}
                ]}"#,
            ))
        });

    let assets = connector(mock_http).get_album_assets("a1").await.unwrap();

    assert_eq!(assets.len(), 2);
    assert_eq!(assets[1].id, "x2");
    assert_eq!(assets[1].original_file_name, "gp_two.mov");
}

#[tokio::test]
async fn test_upload_created_sets_description() {
    let mut mock_http = MockHttpClient::new();
    let mut seq = Sequence::new();
    mock_http
        .expect_execute()
        .withf(|req| {
            let form = match &req.multipart {
                Some(form) => form,
                None => return false,
            };
            let has_file = form.parts.iter().any(|part| {
                matches!(part, MultipartPart::File { name, filename, content_type, data }
                    if name == "assetData"
                        && filename == "gp_AF1Qip_abc_123.jpg"
                        && content_type == "image/jpeg"
                        && &data[..] == b"jpegdata")
            });
            req.method == HttpMethod::Post
                && req.url == "https://immich.example/api/assets"
                && has_file
                && form.text_value("deviceAssetId") == Some("gp_AF1Qip_abc_123.jpg")
        })
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(json_response(201, r#"{"id":"new-1","status":"created"}"#)));
    mock_http
        .expect_execute()
        .withf(|req| {
            req.method == HttpMethod::Put
                && req.url == "https://immich.example/api/assets/new-1"
                && req.body.as_deref() == Some(br#"{"description":"Source Album: Trip (u)"}"#.as_slice())
        })
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(json_response(200, r#"{"id":"new-1"}"#)));

    let receipt = connector(mock_http)
        .upload_asset(upload_request(Some("Source Album: Trip (u)")))
        .await
        .unwrap();

    assert_eq!(receipt.asset_id, "new-1");
    assert!(!receipt.is_duplicate);
}

#[tokio::test]
async fn test_upload_duplicate_skips_description() {
    let mut mock_http = MockHttpClient::new();
    mock_http
        .expect_execute()
        .times(1)
        .returning(|_| Ok(json_response(200, r#"{"id":"old-9","status":"duplicate"}"#)));

    let receipt = connector(mock_http)
        .upload_asset(upload_request(Some("caption")))
        .await
        .unwrap();

    assert_eq!(receipt.asset_id, "old-9");
    assert!(receipt.is_duplicate);
}

#[tokio::test]
async fn test_description_failure_does_not_fail_upload() {
    let mut mock_http = MockHttpClient::new();
    mock_http
        .expect_execute()
        .withf(|req| req.method == HttpMethod::Post)
        .times(1)
        .returning(|_| Ok(json_response(201, r#"{"id":"new-2","status":"created"}"#)));
    mock_http
        .expect_execute()
        .withf(|req| req.method == HttpMethod::Put)
        .times(1)
        .returning(|_| Ok(json_response(500, "boom")));

    let receipt = connector(mock_http)
        .upload_asset(upload_request(Some("caption")))
        .await
        .unwrap();

    assert_eq!(receipt.asset_id, "new-2");
}

#[tokio::test]
async fn test_upload_empty_id_is_error() {
    let mut mock_http = MockHttpClient::new();
    mock_http
        .expect_execute()
        .times(1)
        .returning(|_| Ok(json_response(201, r#"{"id":"","status":"created"}"#)));

    let err = connector(mock_http)
        .upload_asset(upload_request(None))
        .await
        .unwrap_err();

    assert!(matches!(err, BridgeError::Upload(msg) if msg.contains("empty ID")));
}

#[tokio::test]
async fn test_add_assets_to_album() {
    let mut mock_http = MockHttpClient::new();
    mock_http
        .expect_execute()
        .withf(|req| {
            req.method == HttpMethod::Put
                && req.url == "https://immich.example/api/albums/a1/assets"
                && req.body.as_deref() == Some(br#"{"ids":["x1","x2"]}"#.as_slice())
        })
        .times(1)
        .returning(|_| {
            Ok(json_response(
                200,
                r#"[{"id":"x1","success":true},{"id":"x2","success":false,"error":"duplicate"}]"#,
            ))
        });

    let ids = vec!["x1".to_string(), "x2".to_string()];
    connector(mock_http)
        .add_assets_to_album("a1", &ids)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_add_no_assets_makes_no_request() {
    let mock_http = MockHttpClient::new();
    connector(mock_http)
        .add_assets_to_album("a1", &[])
        .await
        .unwrap();
}

#[tokio::test]
async fn test_transport_error_passes_through() {
    let mut mock_http = MockHttpClient::new();
    mock_http
        .expect_execute()
        .times(1)
        .returning(|_| Err(BridgeError::Transport("Connection failed".to_string())));

    let err = connector(mock_http).list_albums().await.unwrap_err();
    assert!(err.is_transport());
}
