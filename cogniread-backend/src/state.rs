use cogniread_embeddings::Embedder;
use cogniread_job_queue::JobQueueClient;

/// Shared application state passed to every route handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub embedder: Embedder,
    pub job_queue: JobQueueClient,
}

impl AppState {
    /// Build a fully initialised state container from its constituent parts.
    pub fn new(embedder: Embedder, job_queue: JobQueueClient) -> Self {
        Self {
            embedder,
            job_queue,
        }
    }
}
