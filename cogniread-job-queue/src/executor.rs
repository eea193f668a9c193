//! Job executor trait for implementing job handlers.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::JobQueueError;

/// Trait for implementing job executors.
///
/// Job executors handle the actual execution of jobs. Each job type consumed by
/// a [`Worker`](crate::Worker) needs a corresponding executor registered with it.
#[async_trait]
pub trait JobExecutor: Send + Sync {
    /// Returns the job type this executor handles.
    fn job_type(&self) -> &str;

    /// Execute the job with its positional arguments.
    ///
    /// Returns the result value stored in the result backend, or an error
    /// that marks the job as failed.
    async fn execute(&self, args: Vec<Value>) -> Result<Value, JobQueueError>;
}
