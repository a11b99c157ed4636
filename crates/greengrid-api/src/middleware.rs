//! Request metrics middleware.

use std::time::Instant;

use axum::extract::{MatchedPath, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tracing::debug;

use crate::ApiState;

/// Time each routed request and count it under its route template, so
/// `/api/v1/regions/{id}/details` is one series regardless of the id.
pub async fn record_request(
    State(state): State<ApiState>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().to_string();
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    let start = Instant::now();

    let response = next.run(request).await;

    let elapsed = start.elapsed();
    state
        .scheduler
        .metrics()
        .record_request(&method, &endpoint, elapsed)
        .await;
    debug!(
        %method,
        %endpoint,
        status = response.status().as_u16(),
        duration = ?elapsed,
        "request completed"
    );
    response
}
