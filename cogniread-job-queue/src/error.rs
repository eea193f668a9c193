//! Error types for the job queue system.

use thiserror::Error;

/// Errors that may occur while interacting with the job queue.
#[derive(Debug, Error)]
pub enum JobQueueError {
    #[error("job queue backend is unavailable: {0}")]
    Unavailable(String),

    #[error("job queue backend error: {0}")]
    Backend(String),

    #[error("unsupported broker url: {0}")]
    UnsupportedBroker(String),

    #[error("no executor registered for job type {0}")]
    UnknownJob(String),

    #[error("invalid job arguments: {0}")]
    InvalidArguments(String),

    #[error("job execution failed: {0}")]
    ExecutionFailed(String),

    #[error("malformed job data: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<redis::RedisError> for JobQueueError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_io_error()
            || err.is_connection_refusal()
            || err.is_connection_dropped()
            || err.is_timeout()
        {
            Self::Unavailable(err.to_string())
        } else {
            Self::Backend(err.to_string())
        }
    }
}
