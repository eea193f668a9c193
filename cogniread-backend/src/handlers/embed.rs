use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, Json};
use serde_json::Value;

use crate::handlers::dto::{EmbedRequest, EmbedResponse};
use crate::handlers::utils::parse_body;
use crate::{error::ApiError, state::AppState};

/// POST /embed
/// Compute the embedding of one text inline.
pub async fn embed(
    Extension(state): Extension<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<EmbedResponse>, ApiError> {
    let request: EmbedRequest = parse_body(body)?;
    request.validate().map_err(|issues| ApiError::validation(&issues))?;

    Ok(Json(EmbedResponse {
        embedding: state.embedder.embed(&request.text),
        dim: state.embedder.dim(),
    }))
}
