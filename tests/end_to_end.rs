//! Full path tests: real vendor client against a stand-in vendor, real redb
//! store on disk, and the HTTP router on top.

use std::io::Cursor;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use image::{ImageFormat, RgbImage};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Match, Mock, MockServer, ResponseTemplate};

use wmgate::server::{build_router, ServerConfig, ServerState};
use wmgate::upstream::Endpoints;
use wmgate::{
    ClientInfo, Gateway, GatewayConfig, GatewayError, HttpVendorClient, ImagePart, Persistence,
    StoreConfig, Submission, UpstreamConfig,
};

const RESULT_URL: &str = "https://cdn.example.com/out/abc.jpg";

fn png(width: u32, height: u32) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    RgbImage::new(width, height)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

fn submission() -> Submission {
    Submission {
        image: ImagePart::new(png(16, 12))
            .with_filename("photo.png")
            .with_content_type("image/png"),
        mask: ImagePart::new(png(16, 12))
            .with_filename("mask.png")
            .with_content_type("image/png"),
        client: ClientInfo {
            ip: Some("203.0.113.7".into()),
            user_agent: Some("e2e-test".into()),
        },
    }
}

/// Matches a multipart body carrying a part named `name`.
///
/// Works on raw bytes: upload bodies hold binary image data and are not UTF-8.
struct HasPart(&'static str);

impl Match for HasPart {
    fn matches(&self, request: &wiremock::Request) -> bool {
        let needle = format!("name=\"{}\"", self.0);
        request
            .body
            .windows(needle.len())
            .any(|window| window == needle.as_bytes())
    }
}

/// Stand-in vendor answering every endpoint the gateway touches.
async fn vendor(benefit: Value) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v9/product/trial"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "200"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v9/benefit/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(benefit))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v6/removeWM/WM"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "200"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v6/removeWM/status"))
        .and(body_string_contains("token=abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "200",
            "data": {"url": RESULT_URL}
        })))
        .mount(&server)
        .await;
    server
}

async fn mount_upload(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/v6/removeWM/upload"))
        .and(HasPart("sign"))
        .and(HasPart("e_id"))
        .and(HasPart("img"))
        .and(HasPart("mask"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "200",
            "token": "abc",
            "taskId": 7
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn client_for(server: &MockServer) -> Arc<HttpVendorClient> {
    let config = UpstreamConfig {
        endpoints: Endpoints::with_base(&server.uri()),
        ..Default::default()
    };
    Arc::new(HttpVendorClient::new(config).unwrap())
}

#[tokio::test]
async fn submit_then_relay_persists_result_url_across_reopen() {
    let server = vendor(json!({"status": "200"})).await;
    mount_upload(&server, 1).await;
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("calls.redb");
    let store_config = StoreConfig::redb(db_path.to_string_lossy().into_owned());

    {
        let store = store_config.build().unwrap();
        let gateway = Gateway::new(client_for(&server), store, GatewayConfig::default());

        let receipt = gateway.submit(submission()).await.unwrap();
        assert_eq!(receipt.token, "abc");

        let first = gateway.relay_status("abc").await.unwrap();
        assert_eq!(first.persistence, Persistence::Updated);
        assert_eq!(first.response["data"]["url"], RESULT_URL);

        let second = gateway.relay_status("abc").await.unwrap();
        assert_eq!(second.persistence, Persistence::Unchanged);
    }

    let store = store_config.build().unwrap();
    let record = store.get("abc").unwrap().unwrap();
    assert_eq!(record.result_url.as_deref(), Some(RESULT_URL));
    assert_eq!(record.e_id.len(), 32);
    assert_eq!(record.client_ip.as_deref(), Some("203.0.113.7"));
    assert_eq!((record.image_width, record.image_height), (Some(16), Some(12)));
    assert_eq!(store.stats().unwrap().resolved_calls, 1);
}

#[tokio::test]
async fn quota_breach_stops_before_upload() {
    let server = vendor(json!({
        "subscriptions": [{
            "benefits": [{"key": "in_size", "limit": 10}]
        }]
    }))
    .await;
    mount_upload(&server, 0).await;

    let store = StoreConfig::in_memory().build().unwrap();
    let gateway = Gateway::new(client_for(&server), store.clone(), GatewayConfig::default());

    let err = gateway.submit(submission()).await.unwrap_err();
    assert!(matches!(err, GatewayError::QuotaExceeded(_)), "{err:?}");
    assert_eq!(store.stats().unwrap().total_calls, 0);
}

#[tokio::test]
async fn http_round_trip_through_router() {
    let server = vendor(json!({"status": "200"})).await;
    mount_upload(&server, 1).await;

    let store = StoreConfig::in_memory().build().unwrap();
    let gateway = Gateway::new(client_for(&server), store.clone(), GatewayConfig::default());
    let router = build_router(Arc::new(ServerState::with_gateway(
        ServerConfig::default(),
        gateway,
    )));

    let boundary = "e2e-boundary";
    let img = png(16, 12);
    let mut body = Vec::new();
    for field in ["img", "mask"] {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{field}.png\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(&img);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

    let request = Request::builder()
        .method("POST")
        .uri("/api/erase")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let receipt: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(receipt["token"], "abc");

    let request = Request::builder()
        .method("POST")
        .uri("/api/erase/status")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"token":"abc"}"#))
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let relayed: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(relayed, json!({"status": "200", "data": {"url": RESULT_URL}}));

    let record = store.get("abc").unwrap().unwrap();
    assert_eq!(record.result_url.as_deref(), Some(RESULT_URL));
}
