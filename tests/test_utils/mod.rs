//! Test utilities for integration tests
#![allow(dead_code)]

use std::sync::{Arc, RwLock};

use axum::{Router, body::Body};
use http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::util::ServiceExt;

use snapcook::api::AppState;
use snapcook::api::app;
use snapcook::core::AppConfig;

pub const BOUNDARY: &str = "snapcook-test-boundary";

pub fn test_config(api_hostname: &str) -> AppConfig {
    AppConfig {
        openai_model: String::from("gpt-4o"),
        openai_api_hostname: api_hostname.to_string(),
        openai_api_key: String::from("test-api-key"),
        request_timeout_secs: 5,
        session_idle_secs: 3600,
        web_ui_path: String::from("./web-ui"),
    }
}

/// Creates a test application router whose model gateway talks to
/// `api_hostname`, usually a `mockito` server.
pub fn test_app(api_hostname: &str) -> Router {
    let app_state = AppState::new(test_config(api_hostname));
    app(Arc::new(RwLock::new(app_state)))
}

pub async fn body_to_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Failed to read body");
    String::from_utf8(bytes.to_vec()).expect("Body is not UTF-8")
}

pub async fn body_to_json(body: Body) -> Value {
    let body = body_to_string(body).await;
    serde_json::from_str(&body).expect("Body is not JSON")
}

/// A successful chat completion response with `content` as the reply
pub fn completion_body(content: &str) -> String {
    json!({
        "id": "chatcmpl-123",
        "object": "chat.completion",
        "created": 1694268190,
        "model": "gpt-4o",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
    .to_string()
}

/// A multipart/form-data body with a single file field
pub fn multipart_body(field: &str, file_name: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn multipart_request(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("POST")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

pub fn json_request(uri: &str, payload: Value) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("POST")
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// Create a session and return its ID
pub async fn create_session(app: &Router) -> String {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/sessions")
                .method("POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_to_json(response.into_body()).await;
    body["id"].as_str().expect("Missing session id").to_string()
}
