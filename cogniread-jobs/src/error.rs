//! Job execution errors.

use cogniread_job_queue::JobQueueError;
use thiserror::Error;

/// Errors that may occur during job execution.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("expected {expected} argument(s), got {actual}")]
    ArgumentCount { expected: usize, actual: usize },

    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

impl From<JobError> for JobQueueError {
    fn from(err: JobError) -> Self {
        JobQueueError::InvalidArguments(err.to_string())
    }
}
