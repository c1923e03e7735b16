//! Integration tests for the HTTP boundary over the demo site.
//!
//! These tests drive the full router in-process with `tower::oneshot`:
//! bearer authentication, the metadata discovery document, and JSON-RPC
//! traffic (singles, batches, notifications) riding `POST /mcp`.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use content_site_mcp::features::McpRegistry;
use content_site_mcp::http::{build_app, AppState};
use content_site_mcp::rpc::{JsonRpcSerializer, RequestManager};
use content_site_mcp::site::{register_features, SiteStore};

const TOKEN: &str = "integration-token";
const PUBLIC_URL: &str = "http://127.0.0.1:8765";

fn site_app() -> Router {
    let mut registry = McpRegistry::new(10);
    let store = Arc::new(SiteStore::with_sample_content());
    register_features(&mut registry, &store, None).unwrap();
    let serializer = JsonRpcSerializer::new(RequestManager::new(Arc::new(registry)));
    build_app(AppState::new(serializer, TOKEN, PUBLIC_URL))
}

fn rpc_request(body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/mcp")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// =============================================================================
// Authentication and Discovery
// =============================================================================

#[tokio::test]
async fn test_challenge_points_at_a_servable_metadata_document() {
    let app = site_app();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/mcp")
                .body(Body::from(
                    json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let challenge = response
        .headers()
        .get(header::WWW_AUTHENTICATE)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();

    // The challenge names a URL; the document behind it must resolve.
    let metadata_url = challenge
        .trim_start_matches("Bearer resource_metadata=\"")
        .trim_end_matches('"');
    let path = metadata_url.trim_start_matches(PUBLIC_URL);
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(path)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["resource"], json!(format!("{PUBLIC_URL}/mcp")));
}

#[tokio::test]
async fn test_wrong_token_never_reaches_the_pipeline() {
    let response = site_app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/mcp")
                .header(header::AUTHORIZATION, "Bearer wrong")
                .body(Body::from(
                    json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["error"], json!("invalid_token"));
}

// =============================================================================
// JSON-RPC over HTTP
// =============================================================================

#[tokio::test]
async fn test_create_post_is_visible_across_requests() {
    let app = site_app();

    let response = app
        .clone()
        .oneshot(rpc_request(&json!({
            "jsonrpc": "2.0", "id": 1, "method": "tools/call",
            "params": {
                "name": "create_post",
                "arguments": {
                    "permalink": "from-http",
                    "title": "Posted over HTTP",
                    "body": "Round trip.",
                    "published": true,
                },
            },
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(
        body["result"]["structuredContent"]["permalink"],
        json!("from-http")
    );

    // The store is shared state; a second request sees the new post.
    let response = app
        .oneshot(rpc_request(&json!({
            "jsonrpc": "2.0", "id": 2, "method": "resources/read",
            "params": {"uri": "post://from-http"},
        })))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert!(body["result"]["contents"][0]["text"]
        .as_str()
        .unwrap()
        .starts_with("# Posted over HTTP"));
}

#[tokio::test]
async fn test_batch_returns_a_json_array() {
    let response = site_app()
        .oneshot(rpc_request(&json!([
            {"jsonrpc": "2.0", "id": 1, "method": "tools/list"},
            {"jsonrpc": "2.0", "method": "prompts/list"},
            {"jsonrpc": "2.0", "id": 2, "method": "no/such"},
        ])))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let responses = body.as_array().unwrap();
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["id"], json!(1));
    assert_eq!(responses[1]["error"]["code"], json!(-32601));
}

#[tokio::test]
async fn test_all_notifications_return_no_content() {
    let response = site_app()
        .oneshot(rpc_request(&json!([
            {"jsonrpc": "2.0", "method": "tools/list"},
            {"jsonrpc": "2.0", "id": null, "method": "prompts/list"},
        ])))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert!(bytes.is_empty());
}

#[tokio::test]
async fn test_protocol_errors_still_ride_http_200() {
    let response = site_app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/mcp")
                .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
                .body(Body::from("{broken"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], json!(-32700));
    assert_eq!(body["id"], Value::Null);
}
