//! Route handlers.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use crate::rpc::RpcOutcome;

use super::AppState;

/// The JSON-RPC endpoint. Parse and protocol errors still produce a 200
/// with a JSON-RPC error envelope; only an all-notification body changes
/// the HTTP status.
pub async fn mcp_endpoint(State(state): State<AppState>, body: Bytes) -> Response {
    match state.rpc.process(&body) {
        RpcOutcome::Single(response) => Json(response).into_response(),
        RpcOutcome::Batch(responses) => Json(Value::Array(responses)).into_response(),
        RpcOutcome::NoContent => StatusCode::NO_CONTENT.into_response(),
    }
}

/// Liveness probe.
pub async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

/// The protected-resource metadata document referenced by the bearer
/// challenge.
pub async fn resource_metadata(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "resource": &*state.resource_url,
        "bearer_methods_supported": ["header"],
    }))
}
