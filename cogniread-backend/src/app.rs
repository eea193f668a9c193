use std::sync::Arc;

use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Extension};
use axum::http::{HeaderName, Request};
use axum::routing::{get, post};
use axum::Router;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

// Body limit: 32 MiB. The largest ingest batch, 200 texts of 20000 characters,
// is at most 24 MB even if every character is JSON-escaped as `\uXXXX`.
pub const DEFAULT_BODY_LIMIT: usize = 32 * 1024 * 1024;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Build the API router with the provided shared application state.
pub fn build_router(state: Arc<AppState>) -> Router {
    let router = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/embed", post(handlers::embed::embed))
        .route("/ingest", post(handlers::ingest::ingest))
        .route("/tasks/{task_id}", get(handlers::tasks::get))
        .layer(DefaultBodyLimit::max(DEFAULT_BODY_LIMIT))
        .layer(Extension(state));

    with_request_tracing(router)
}

/// Router served by the worker process for liveness probes.
pub fn build_health_router() -> Router {
    with_request_tracing(Router::new().route("/health", get(handlers::health::health)))
}

/// Trace every request and tag it with an `x-request-id`.
///
/// An incoming id is kept; otherwise a UUID is generated. The id is echoed on the response.
fn with_request_tracing(router: Router) -> Router {
    let header = HeaderName::from_static(REQUEST_ID_HEADER);

    // layers wrap outward: the id is set before the trace span opens
    router
        .layer(PropagateRequestIdLayer::new(header.clone()))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }),
        )
        .layer(SetRequestIdLayer::new(header, MakeRequestUuid))
}
