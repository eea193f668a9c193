//! In-process broker and result backend.
//!
//! Messages live in per-queue FIFOs and are handed to whichever subscriber
//! polls first. Nothing survives the process; use it for tests and for running
//! the API and a worker inside one process.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream;
use tokio::sync::{Mutex, Notify, RwLock};
use tokio_util::sync::CancellationToken;

use crate::broker::{Broker, JobStream, ResultBackend};
use crate::error::JobQueueError;
use crate::types::{JobId, JobMessage, JobRecord, JobRequest};

/// Maximum number of job records to keep in memory.
const MAX_JOB_RECORDS: usize = 1000;

/// Record storage optimized for both eviction order and lookup by ID.
#[derive(Debug, Default)]
struct RecordStore {
    /// Record IDs in insertion order (oldest first).
    order: VecDeque<JobId>,
    records: HashMap<JobId, JobRecord>,
}

impl RecordStore {
    /// Insert or replace a record, maintaining the size limit.
    fn upsert(&mut self, record: JobRecord) {
        let id = record.id;
        if self.records.insert(id, record).is_none() {
            self.order.push_back(id);
        }

        while self.order.len() > MAX_JOB_RECORDS {
            if let Some(old_id) = self.order.pop_front() {
                self.records.remove(&old_id);
            }
        }
    }

    #[inline]
    fn get(&self, id: &JobId) -> Option<&JobRecord> {
        self.records.get(id)
    }

    #[inline]
    fn len(&self) -> usize {
        self.records.len()
    }
}

#[derive(Default)]
struct Inner {
    queues: Mutex<HashMap<String, VecDeque<JobMessage>>>,
    available: Notify,
    records: RwLock<RecordStore>,
}

impl Inner {
    async fn pop(&self, queue: &str) -> Option<JobMessage> {
        let mut queues = self.queues.lock().await;
        queues.get_mut(queue).and_then(VecDeque::pop_front)
    }
}

/// Process-local [`Broker`] and [`ResultBackend`]. Clones share state.
#[derive(Clone, Default)]
pub struct MemoryBroker {
    inner: Arc<Inner>,
}

impl fmt::Debug for MemoryBroker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryBroker")
            .field("queues", &"<Mutex<HashMap<String, VecDeque<JobMessage>>>>")
            .field("records", &"<RwLock<RecordStore>>")
            .finish()
    }
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of messages waiting on `queue`.
    pub async fn queue_len(&self, queue: &str) -> usize {
        let queues = self.inner.queues.lock().await;
        queues.get(queue).map_or(0, VecDeque::len)
    }

    /// Number of job records currently held.
    pub async fn record_count(&self) -> usize {
        self.inner.records.read().await.len()
    }
}

#[async_trait]
impl Broker for MemoryBroker {
    async fn submit(&self, queue: &str, request: JobRequest) -> Result<JobId, JobQueueError> {
        let message = JobMessage::new(queue, request);
        let id = message.id;

        self.inner
            .records
            .write()
            .await
            .upsert(JobRecord::pending(&message));
        self.inner
            .queues
            .lock()
            .await
            .entry(queue.to_string())
            .or_default()
            .push_back(message);
        self.inner.available.notify_waiters();

        Ok(id)
    }

    fn subscribe(&self, queue: &str, shutdown: CancellationToken) -> JobStream {
        let state = (self.inner.clone(), queue.to_string(), shutdown);
        Box::pin(stream::unfold(
            state,
            |(inner, queue, shutdown)| async move {
                loop {
                    // Register interest before checking so a concurrent submit
                    // cannot slip between the check and the wait.
                    let notified = inner.available.notified();
                    if let Some(message) = inner.pop(&queue).await {
                        drop(notified);
                        return Some((Ok(message), (inner, queue, shutdown)));
                    }
                    tokio::select! {
                        _ = notified => {}
                        _ = shutdown.cancelled() => return None,
                    }
                }
            },
        ))
    }
}

#[async_trait]
impl ResultBackend for MemoryBroker {
    async fn store(&self, record: JobRecord) -> Result<(), JobQueueError> {
        self.inner.records.write().await.upsert(record);
        Ok(())
    }

    async fn fetch(&self, id: JobId) -> Result<Option<JobRecord>, JobQueueError> {
        Ok(self.inner.records.read().await.get(&id).cloned())
    }
}
