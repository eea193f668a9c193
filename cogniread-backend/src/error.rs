use axum::{http::StatusCode, response::IntoResponse, Json};
use cogniread_job_queue::JobQueueError;
use serde_json::json;
use thiserror::Error;

use crate::validation::{to_payload, ValidationIssue};

/// Top-level API error shared by all route handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("job queue error: {0}")]
    JobQueue(#[from] JobQueueError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("request body too large: {0}")]
    PayloadTooLarge(String),
    #[error("validation error")]
    Validation(serde_json::Value),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            ApiError::JobQueue(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let payload = match self {
            ApiError::Validation(v) => v,
            other => json!({ "error": other.to_string() }),
        };

        (status, Json(payload)).into_response()
    }
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Validation failure carrying the structured issue list.
    pub fn validation(issues: &[ValidationIssue]) -> Self {
        Self::Validation(to_payload(issues))
    }

    /// Validation failure for a single field.
    pub fn invalid_field(
        field: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::validation(&[ValidationIssue::new(field, code, message)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        let cases = [
            (
                ApiError::JobQueue(JobQueueError::Unavailable("down".into())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (ApiError::not_found("task"), StatusCode::NOT_FOUND),
            (
                ApiError::PayloadTooLarge("length limit exceeded".into()),
                StatusCode::PAYLOAD_TOO_LARGE,
            ),
            (
                ApiError::invalid_field("text", "too_short", "empty"),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
