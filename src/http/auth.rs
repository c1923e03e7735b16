//! Bearer-token authentication for the protected routes.
//!
//! Failure responses carry a `WWW-Authenticate` challenge pointing at the
//! resource metadata document, so callers can discover how to obtain
//! credentials. The configured token is compared, never echoed back.

use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;
use serde_json::json;

use super::AppState;

/// Middleware that admits only requests presenting the configured token.
pub async fn require_bearer_token(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    request: Request,
    next: Next,
) -> Response {
    match bearer {
        Some(TypedHeader(authorization)) if authorization.token() == &*state.api_token => {
            next.run(request).await
        }
        Some(_) => unauthorized(&state, "Invalid bearer token"),
        None => unauthorized(&state, "Missing bearer token"),
    }
}

fn unauthorized(state: &AppState, description: &str) -> Response {
    let challenge = format!(
        "Bearer resource_metadata=\"{}\"",
        state.resource_metadata_url
    );
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, challenge)],
        Json(json!({
            "error": "invalid_token",
            "error_description": description,
        })),
    )
        .into_response()
}
