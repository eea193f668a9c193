use axum::Json;

use crate::handlers::dto::HealthResponse;

/// GET /health
/// Liveness probe. Always returns `{"status": "ok"}` while the process serves requests.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
