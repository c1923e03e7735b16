//! HTTP boundary: router, bearer authentication and request logging.
//!
//! One protected route (`POST /mcp`) carries the whole JSON-RPC surface.
//! Two unauthenticated routes support discovery: `GET /health` and the
//! protected-resource metadata document that the 401 challenge points to.

pub mod auth;
pub mod handlers;
pub mod logging;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::rpc::JsonRpcSerializer;

/// Shared state handed to every handler and middleware.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The JSON-RPC pipeline.
    pub(crate) rpc: Arc<JsonRpcSerializer>,
    /// The bearer token requests must present. Compared, never logged.
    pub(crate) api_token: Arc<str>,
    /// Public URL of the protected resource itself.
    pub(crate) resource_url: Arc<str>,
    /// Public URL of the resource metadata document, used in challenges.
    pub(crate) resource_metadata_url: Arc<str>,
}

impl AppState {
    /// Builds state from the pipeline and the externally visible URLs.
    #[must_use]
    pub fn new(serializer: JsonRpcSerializer, api_token: &str, public_url: &str) -> Self {
        let public = public_url.trim_end_matches('/');
        Self {
            rpc: Arc::new(serializer),
            api_token: Arc::from(api_token),
            resource_url: Arc::from(format!("{public}/mcp")),
            resource_metadata_url: Arc::from(format!(
                "{public}/.well-known/oauth-protected-resource"
            )),
        }
    }
}

/// Assembles the application router.
#[must_use]
pub fn build_app(state: AppState) -> Router {
    let protected = Router::new()
        .route("/mcp", post(handlers::mcp_endpoint))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_bearer_token,
        ));

    let public = Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/.well-known/oauth-protected-resource",
            get(handlers::resource_metadata),
        );

    protected
        .merge(public)
        .layer(middleware::from_fn(logging::request_logging))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::features::{AbstractType, McpRegistry, ParamSpec, ToolOutcome, ToolSpec};
    use crate::rpc::RequestManager;

    use super::*;

    const TOKEN: &str = "test-token";

    fn test_app() -> Router {
        let mut registry = McpRegistry::new(10);
        registry.register_tool(
            ToolSpec::new("echo").with_param(ParamSpec::required("text", AbstractType::String)),
            |args| {
                let text = args["text"].as_str().unwrap_or_default();
                Ok(ToolOutcome::text(text)?)
            },
        );
        let serializer = JsonRpcSerializer::new(RequestManager::new(Arc::new(registry)));
        build_app(AppState::new(
            serializer,
            TOKEN,
            "http://127.0.0.1:8765",
        ))
    }

    fn rpc_request(token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/mcp")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn missing_token_gets_a_challenge() {
        let response = test_app()
            .oneshot(rpc_request(
                None,
                json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let challenge = response
            .headers()
            .get(header::WWW_AUTHENTICATE)
            .and_then(|v| v.to_str().ok())
            .unwrap();
        assert!(challenge.starts_with("Bearer resource_metadata="));
        assert!(challenge.contains("/.well-known/oauth-protected-resource"));
    }

    #[tokio::test]
    async fn wrong_token_is_rejected() {
        let response = test_app()
            .oneshot(rpc_request(
                Some("wrong"),
                json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(response).await;
        assert_eq!(body["error"], json!("invalid_token"));
    }

    #[tokio::test]
    async fn valid_token_reaches_the_pipeline() {
        let response = test_app()
            .oneshot(rpc_request(
                Some(TOKEN),
                json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["result"]["tools"][0]["name"], json!("echo"));
    }

    #[tokio::test]
    async fn notifications_return_no_content() {
        let response = test_app()
            .oneshot(rpc_request(
                Some(TOKEN),
                json!({"jsonrpc": "2.0", "method": "tools/list"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn health_is_unauthenticated() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], json!("ok"));
    }

    #[tokio::test]
    async fn metadata_document_names_the_resource() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/.well-known/oauth-protected-resource")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["resource"], json!("http://127.0.0.1:8765/mcp"));
        assert_eq!(body["bearer_methods_supported"], json!(["header"]));
    }
}
