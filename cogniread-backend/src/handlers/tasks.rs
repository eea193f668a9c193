use std::sync::Arc;

use axum::extract::{Extension, Path};
use axum::Json;
use cogniread_job_queue::{JobId, JobRecord};

use crate::{error::ApiError, state::AppState};

/// GET /tasks/{task_id}
/// Current record of a submitted task. Never waits for completion.
pub async fn get(
    Extension(state): Extension<Arc<AppState>>,
    Path(task_id): Path<String>,
) -> Result<Json<JobRecord>, ApiError> {
    let id: JobId = task_id.parse().map_err(|_| {
        ApiError::invalid_field("task_id", "invalid_uuid", "task_id must be a UUID")
    })?;

    state
        .job_queue
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("task {id}")))
}
