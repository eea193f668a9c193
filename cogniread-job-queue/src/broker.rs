//! Broker and result-backend interfaces, and broker selection by URL.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::BoxStream;
use tokio_util::sync::CancellationToken;

use crate::error::JobQueueError;
use crate::memory::MemoryBroker;
use crate::redis_broker::RedisBroker;
use crate::types::{JobId, JobMessage, JobRecord, JobRequest};

/// Stream of jobs delivered to one consumer.
pub type JobStream = BoxStream<'static, Result<JobMessage, JobQueueError>>;

/// Producer/consumer side of the shared job queue.
#[async_trait]
pub trait Broker: Send + Sync {
    /// Enqueue `request` on `queue` and return the id assigned to it.
    ///
    /// A pending [`JobRecord`] is written alongside the message, before any
    /// consumer can observe it.
    async fn submit(&self, queue: &str, request: JobRequest) -> Result<JobId, JobQueueError>;

    /// Subscribe to `queue`. Every message is delivered to exactly one subscriber.
    ///
    /// The stream ends once `shutdown` is cancelled, but only while it is
    /// waiting: a message already taken off the queue is still yielded.
    fn subscribe(&self, queue: &str, shutdown: CancellationToken) -> JobStream;
}

/// Key-value store of job outcomes.
#[async_trait]
pub trait ResultBackend: Send + Sync {
    async fn store(&self, record: JobRecord) -> Result<(), JobQueueError>;

    async fn fetch(&self, id: JobId) -> Result<Option<JobRecord>, JobQueueError>;
}

/// Tunables for [`connect`].
#[derive(Debug, Clone, Copy)]
pub struct ConnectOptions {
    /// How long job records stay in the result backend.
    pub result_ttl: Duration,
    /// Idle wait between polls of an empty queue.
    pub poll_interval: Duration,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            result_ttl: Duration::from_secs(86_400),
            poll_interval: Duration::from_millis(250),
        }
    }
}

/// A broker and the result backend that goes with it.
#[derive(Clone)]
pub struct Connection {
    pub broker: Arc<dyn Broker>,
    pub results: Arc<dyn ResultBackend>,
}

impl Connection {
    pub fn new(broker: Arc<dyn Broker>, results: Arc<dyn ResultBackend>) -> Self {
        Self { broker, results }
    }

    /// Use one value as both broker and result backend.
    pub fn shared<B>(backend: B) -> Self
    where
        B: Broker + ResultBackend + 'static,
    {
        let backend = Arc::new(backend);
        Self {
            broker: backend.clone(),
            results: backend,
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("broker", &"<dyn Broker>")
            .field("results", &"<dyn ResultBackend>")
            .finish()
    }
}

/// Open the broker named by `url`.
///
/// `redis://` selects [`RedisBroker`]; `memory://` selects a
/// fresh process-local [`MemoryBroker`].
pub fn connect(url: &str, options: ConnectOptions) -> Result<Connection, JobQueueError> {
    let parsed =
        url::Url::parse(url).map_err(|_| JobQueueError::UnsupportedBroker(url.to_string()))?;
    match parsed.scheme() {
        "memory" => Ok(Connection::shared(MemoryBroker::new())),
        "redis" => Ok(Connection::shared(RedisBroker::open(url, options)?)),
        _ => Err(JobQueueError::UnsupportedBroker(url.to_string())),
    }
}

/// True when `url` names a process-local broker that no other process can reach.
pub fn is_in_process(url: &str) -> bool {
    url::Url::parse(url).is_ok_and(|u| u.scheme() == "memory")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_selects_by_scheme() {
        assert!(connect("memory://", ConnectOptions::default()).is_ok());
        // opening a redis client does not dial the server
        assert!(connect("redis://127.0.0.1:6379/0", ConnectOptions::default()).is_ok());
        assert!(matches!(
            connect("amqp://localhost", ConnectOptions::default()),
            Err(JobQueueError::UnsupportedBroker(_))
        ));
        assert!(matches!(
            connect("::", ConnectOptions::default()),
            Err(JobQueueError::UnsupportedBroker(_))
        ));
    }

    #[test]
    fn only_memory_urls_are_in_process() {
        assert!(is_in_process("memory://"));
        assert!(!is_in_process("redis://redis:6379/0"));
        assert!(!is_in_process("not a url"));
    }
}
