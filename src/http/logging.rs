//! Request logging middleware.

use std::time::Instant;

use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;
use tracing::{info, warn};

/// Logs every request with its method, path, status and duration.
/// Rejected credentials log at warn so they stand out at the default
/// level.
pub async fn request_logging(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
    if status == StatusCode::UNAUTHORIZED {
        warn!(%method, path, %status, duration_ms, "Rejected request");
    } else {
        info!(%method, path, %status, duration_ms, "Handled request");
    }
    response
}
