mod common;

use assert_matches::assert_matches;
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

use common::TestApp;
use watchstore_core::errors::StoreError;
use watchstore_core::events::Notice;

#[tokio::test]
async fn test_requests_carry_the_bearer_token() {
    let app = TestApp::new().await;

    Mock::given(method("GET"))
        .and(path("/products"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&app.server)
        .await;

    let body: Value = app.client.get("/products").await.unwrap();
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_requests_without_a_session_send_no_auth_header() {
    let app = TestApp::new().await;
    app.session.clear().await;

    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&app.server)
        .await;

    let _: Value = app.client.get("/products").await.unwrap();

    let requests = app.server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].headers.contains_key("authorization"));
}

#[tokio::test]
async fn test_expired_token_clears_the_session_and_notifies_once() {
    let mut app = TestApp::new().await;

    Mock::given(method("GET"))
        .and(path("/orders"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&app.server)
        .await;

    let err = app.client.get::<Value>("/orders").await.unwrap_err();
    assert_matches!(err, StoreError::SessionExpired);
    assert!(!app.session.is_authenticated());

    let notices = app.drain_notices();
    assert_eq!(notices.len(), 1);
    assert_matches!(notices[0], Notice::SessionExpired { .. });
}

#[tokio::test]
async fn test_error_envelope_yields_the_server_message() {
    let app = TestApp::new().await;

    Mock::given(method("GET"))
        .and(path("/with-message"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "message": "Dữ liệu không hợp lệ" })),
        )
        .mount(&app.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/with-error"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "error": "Không tìm thấy sản phẩm" })),
        )
        .mount(&app.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/bare"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&app.server)
        .await;

    let err = app.client.get::<Value>("/with-message").await.unwrap_err();
    assert_matches!(
        err,
        StoreError::RemoteCall { status: 400, ref message } if message == "Dữ liệu không hợp lệ"
    );

    let err = app.client.get::<Value>("/with-error").await.unwrap_err();
    assert_matches!(
        err,
        StoreError::RemoteCall { status: 404, ref message } if message == "Không tìm thấy sản phẩm"
    );

    // No envelope at all falls back to the reason phrase.
    let err = app.client.get::<Value>("/bare").await.unwrap_err();
    assert_matches!(
        err,
        StoreError::RemoteCall { status: 404, ref message } if message == "Not Found"
    );
}

#[tokio::test]
async fn test_server_fault_raises_a_system_notice() {
    let mut app = TestApp::new().await;

    Mock::given(method("GET"))
        .and(path("/orders"))
        .respond_with(
            ResponseTemplate::new(503).set_body_json(json!({ "message": "upstream down" })),
        )
        .mount(&app.server)
        .await;

    let err = app.client.get::<Value>("/orders").await.unwrap_err();
    assert_matches!(err, StoreError::RemoteCall { status: 503, .. });

    let notices = app.drain_notices();
    assert_eq!(notices.len(), 1);
    assert_matches!(notices[0], Notice::SystemFault { status: 503, .. });
}

#[tokio::test]
async fn test_empty_success_bodies_parse_as_null() {
    let app = TestApp::new().await;

    Mock::given(method("GET"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&app.server)
        .await;

    // Endpoints that answer 200 with no body still parse.
    let body: Value = app.client.get("/ping").await.unwrap();
    assert_eq!(body, Value::Null);
}
