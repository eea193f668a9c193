//! Redis-backed broker and result backend.
//!
//! Each queue is a Redis list named after the queue: producers `LPUSH`, and
//! consumers `RPOP`, so a message is handed to exactly one consumer. Job
//! records are JSON strings under `cogniread-task-meta-<id>` with a TTL.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::broker::{Broker, ConnectOptions, JobStream, ResultBackend};
use crate::error::JobQueueError;
use crate::types::{JobId, JobMessage, JobRecord, JobRequest};

const RESULT_KEY_PREFIX: &str = "cogniread-task-meta-";

fn result_key(id: &JobId) -> String {
    format!("{RESULT_KEY_PREFIX}{id}")
}

/// [`Broker`] and [`ResultBackend`] over a Redis server. Clones share one
/// lazily established, auto-reconnecting connection.
#[derive(Clone)]
pub struct RedisBroker {
    client: Client,
    connection: Arc<OnceCell<ConnectionManager>>,
    options: ConnectOptions,
}

impl fmt::Debug for RedisBroker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisBroker")
            .field("client", &"<redis::Client>")
            .field("options", &self.options)
            .finish()
    }
}

impl RedisBroker {
    /// Build a broker for `url`. No connection is made until first use.
    pub fn open(url: &str, options: ConnectOptions) -> Result<Self, JobQueueError> {
        let client = Client::open(url)?;
        Ok(Self {
            client,
            connection: Arc::new(OnceCell::new()),
            options,
        })
    }

    async fn connection(&self) -> Result<ConnectionManager, JobQueueError> {
        let conn = self
            .connection
            .get_or_try_init(|| ConnectionManager::new(self.client.clone()))
            .await?;
        Ok(conn.clone())
    }

    #[inline]
    fn ttl_secs(&self) -> u64 {
        self.options.result_ttl.as_secs().max(1)
    }

    /// Wait one poll interval. Returns `false` if shutdown came first.
    async fn idle(&self, shutdown: &CancellationToken) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(self.options.poll_interval) => true,
            _ = shutdown.cancelled() => false,
        }
    }

    async fn pop(&self, queue: &str) -> Result<Option<JobMessage>, JobQueueError> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn.rpop(queue, None).await?;
        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl Broker for RedisBroker {
    async fn submit(&self, queue: &str, request: JobRequest) -> Result<JobId, JobQueueError> {
        let message = JobMessage::new(queue, request);
        let record = serde_json::to_string(&JobRecord::pending(&message))?;
        let payload = serde_json::to_string(&message)?;

        let mut conn = self.connection().await?;
        let _: () = redis::pipe()
            .atomic()
            .set_ex(result_key(&message.id), record, self.ttl_secs())
            .ignore()
            .lpush(queue, payload)
            .ignore()
            .query_async(&mut conn)
            .await?;

        debug!(job_id = %message.id, queue, "job pushed to redis");
        Ok(message.id)
    }

    fn subscribe(&self, queue: &str, shutdown: CancellationToken) -> JobStream {
        let state = (self.clone(), queue.to_string(), shutdown, false);
        Box::pin(stream::unfold(
            state,
            |(broker, queue, shutdown, backoff)| async move {
                if backoff && !broker.idle(&shutdown).await {
                    return None;
                }
                loop {
                    if shutdown.is_cancelled() {
                        return None;
                    }
                    // Not raced against shutdown: once RPOP is sent the
                    // message is off the list and must reach the worker.
                    match broker.pop(&queue).await {
                        Ok(Some(message)) => {
                            return Some((Ok(message), (broker, queue, shutdown, false)))
                        }
                        Ok(None) => {
                            if !broker.idle(&shutdown).await {
                                return None;
                            }
                        }
                        Err(e) => return Some((Err(e), (broker, queue, shutdown, true))),
                    }
                }
            },
        ))
    }
}

#[async_trait]
impl ResultBackend for RedisBroker {
    async fn store(&self, record: JobRecord) -> Result<(), JobQueueError> {
        let key = result_key(&record.id);
        let value = serde_json::to_string(&record)?;
        let mut conn = self.connection().await?;
        let _: () = conn.set_ex(key, value, self.ttl_secs()).await?;
        Ok(())
    }

    async fn fetch(&self, id: JobId) -> Result<Option<JobRecord>, JobQueueError> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn.get(result_key(&id)).await?;
        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn result_keys_are_prefixed() {
        let id: JobId = "550e8400-e29b-41d4-a716-446655440000".parse().unwrap();
        assert_eq!(
            result_key(&id),
            "cogniread-task-meta-550e8400-e29b-41d4-a716-446655440000"
        );
    }

    #[test]
    fn ttl_never_rounds_to_zero() {
        let broker = RedisBroker::open(
            "redis://127.0.0.1:6379/0",
            ConnectOptions {
                result_ttl: Duration::from_millis(10),
                poll_interval: Duration::from_millis(10),
            },
        )
        .unwrap();
        assert_eq!(broker.ttl_secs(), 1);
    }

    #[test]
    fn open_rejects_non_redis_url() {
        assert!(RedisBroker::open("http://localhost", ConnectOptions::default()).is_err());
    }

    #[tokio::test]
    async fn subscription_ends_without_dialing_once_shut_down() {
        // nothing listens on port 1; a pop attempt would surface as an error item
        let broker =
            RedisBroker::open("redis://127.0.0.1:1/0", ConnectOptions::default()).unwrap();
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let mut jobs = broker.subscribe("q", shutdown);
        assert!(futures::StreamExt::next(&mut jobs).await.is_none());
    }
}
