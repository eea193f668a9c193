//! Job queue client used by producers.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::broker::{Broker, Connection, ResultBackend};
use crate::error::JobQueueError;
use crate::types::{JobId, JobRecord, JobRequest};

/// Interface for submitting jobs to one named queue and looking up their state.
#[derive(Clone)]
pub struct JobQueueClient {
    queue: Arc<str>,
    broker: Arc<dyn Broker>,
    results: Arc<dyn ResultBackend>,
}

impl fmt::Debug for JobQueueClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobQueueClient")
            .field("queue", &self.queue)
            .field("broker", &"<dyn Broker>")
            .field("results", &"<dyn ResultBackend>")
            .finish()
    }
}

impl JobQueueClient {
    pub fn new(queue: impl Into<String>, connection: Connection) -> Self {
        Self {
            queue: Arc::from(queue.into()),
            broker: connection.broker,
            results: connection.results,
        }
    }

    /// Name of the queue this client submits to.
    #[inline]
    pub fn queue(&self) -> &str {
        &self.queue
    }

    /// Enqueue a job for asynchronous processing and return its id.
    ///
    /// Returns as soon as the broker has accepted the message; execution
    /// happens later on whichever worker takes it.
    pub async fn submit(
        &self,
        job_type: impl Into<String>,
        args: Vec<Value>,
    ) -> Result<JobId, JobQueueError> {
        let request = JobRequest::new(job_type, args);
        let job_type = request.job_type.clone();
        let id = self.broker.submit(&self.queue, request).await?;
        debug!(job_id = %id, job_type = %job_type, queue = %self.queue, "job submitted");
        Ok(id)
    }

    /// Current record for `id`, or `None` if unknown or expired.
    pub async fn get(&self, id: JobId) -> Result<Option<JobRecord>, JobQueueError> {
        self.results.fetch(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBroker;
    use crate::types::JobStatus;
    use serde_json::json;

    #[tokio::test]
    async fn submit_and_get() {
        let broker = MemoryBroker::new();
        let client = JobQueueClient::new("ai-tasks", Connection::shared(broker.clone()));
        assert_eq!(client.queue(), "ai-tasks");

        let id = client.submit("demo", vec![json!("hi")]).await.unwrap();
        assert_eq!(broker.queue_len("ai-tasks").await, 1);

        let record = client.get(id).await.unwrap().expect("record");
        assert_eq!(record.status, JobStatus::Pending);
        assert!(client.get(JobId::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn ids_are_unique_per_submission() {
        let client = JobQueueClient::new("q", Connection::shared(MemoryBroker::new()));
        let a = client.submit("demo", vec![json!("same")]).await.unwrap();
        let b = client.submit("demo", vec![json!("same")]).await.unwrap();
        assert_ne!(a, b);
    }
}
