use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, Json};
use cogniread_jobs::job_types;
use serde_json::Value;

use crate::handlers::dto::{IngestRequest, IngestResponse};
use crate::handlers::utils::parse_body;
use crate::{error::ApiError, state::AppState};

/// POST /ingest
/// Queue one `worker.process_text` job per non-empty text.
///
/// Ids come back in input order. A broker failure aborts the batch; jobs
/// submitted before the failure stay queued.
pub async fn ingest(
    Extension(state): Extension<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<IngestResponse>, ApiError> {
    let request: IngestRequest = parse_body(body)?;
    request.validate().map_err(|issues| ApiError::validation(&issues))?;

    let mut task_ids = Vec::with_capacity(request.texts.len());
    for text in request.submittable() {
        let id = state
            .job_queue
            .submit(job_types::PROCESS_TEXT, vec![Value::from(text)])
            .await?;
        task_ids.push(id);
    }

    tracing::info!(
        received = request.texts.len(),
        submitted = task_ids.len(),
        queue = %state.job_queue.queue(),
        "ingest batch queued"
    );

    Ok(Json(IngestResponse { task_ids }))
}
