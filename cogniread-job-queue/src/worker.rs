//! Worker runtime: consumes a queue and runs registered executors.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::broker::{Broker, Connection, ResultBackend};
use crate::error::JobQueueError;
use crate::executor::JobExecutor;
use crate::types::{JobMessage, JobRecord};

/// Executes a single job and records every state change.
#[derive(Clone)]
struct JobRunner {
    results: Arc<dyn ResultBackend>,
    executors: Arc<HashMap<String, Arc<dyn JobExecutor>>>,
}

impl JobRunner {
    async fn run(&self, message: JobMessage) -> JobRecord {
        let mut record = JobRecord::pending(&message);
        record.start();
        self.record(&record).await;
        debug!(job_id = %message.id, job_type = %message.job_type, "job started");

        let outcome = match self.executors.get(&message.job_type).cloned() {
            Some(executor) => {
                let args = message.args;
                // Own task so a panicking executor only fails its job.
                match tokio::spawn(async move { executor.execute(args).await }).await {
                    Ok(result) => result,
                    Err(join_err) if join_err.is_panic() => Err(JobQueueError::ExecutionFailed(
                        "executor panicked".to_string(),
                    )),
                    Err(join_err) => Err(JobQueueError::ExecutionFailed(join_err.to_string())),
                }
            }
            None => Err(JobQueueError::UnknownJob(message.job_type.clone())),
        };

        match outcome {
            Ok(result) => {
                record.complete(result);
                info!(job_id = %record.id, job_type = %record.job_type, "job completed");
            }
            Err(e) => {
                record.fail(e.to_string());
                warn!(job_id = %record.id, job_type = %record.job_type, error = %e, "job failed");
            }
        }
        self.record(&record).await;
        record
    }

    async fn record(&self, record: &JobRecord) {
        if let Err(e) = self.results.store(record.clone()).await {
            error!(job_id = %record.id, status = %record.status, error = %e, "failed to store job record");
        }
    }
}

/// Long-lived consumer of one queue.
pub struct Worker {
    queue: String,
    broker: Arc<dyn Broker>,
    runner: JobRunner,
    executors: HashMap<String, Arc<dyn JobExecutor>>,
    concurrency: usize,
}

impl fmt::Debug for Worker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Worker")
            .field("queue", &self.queue)
            .field("job_types", &self.job_types())
            .field("concurrency", &self.concurrency)
            .finish()
    }
}

impl Worker {
    pub fn new(queue: impl Into<String>, connection: Connection) -> Self {
        Self {
            queue: queue.into(),
            broker: connection.broker,
            runner: JobRunner {
                results: connection.results,
                executors: Arc::new(HashMap::new()),
            },
            executors: HashMap::new(),
            concurrency: 1,
        }
    }

    /// Maximum number of jobs executed at once (at least 1).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Register a job executor for a specific job type.
    pub fn register_executor<E: JobExecutor + 'static>(&mut self, executor: E) {
        let job_type = executor.job_type().to_owned();
        self.executors.insert(job_type, Arc::new(executor));
        self.runner.executors = Arc::new(self.executors.clone());
    }

    /// Registered job types, sorted.
    pub fn job_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.executors.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    #[inline]
    pub fn queue(&self) -> &str {
        &self.queue
    }

    /// Execute one delivered job and record its outcome.
    pub async fn process(&self, message: JobMessage) -> JobRecord {
        self.runner.run(message).await
    }

    /// Consume the queue until `shutdown` is cancelled or the broker stream ends.
    ///
    /// A message the broker has already handed over is still run. In-flight
    /// jobs are awaited before returning.
    pub async fn run(&self, shutdown: CancellationToken) -> Result<(), JobQueueError> {
        info!(
            queue = %self.queue,
            concurrency = self.concurrency,
            job_types = ?self.job_types(),
            "worker started"
        );

        let mut jobs = self.broker.subscribe(&self.queue, shutdown.clone());
        let permits = Arc::new(Semaphore::new(self.concurrency));
        let mut in_flight = JoinSet::new();

        loop {
            let permit = tokio::select! {
                _ = shutdown.cancelled() => break,
                permit = permits.clone().acquire_owned() => permit
                    .map_err(|_| JobQueueError::Unavailable("worker pool closed".to_string()))?,
            };

            // The stream observes `shutdown` itself, and only where no
            // message can be lost, so it is not raced here.
            match jobs.next().await {
                Some(Ok(message)) => {
                    let runner = self.runner.clone();
                    in_flight.spawn(async move {
                        let _permit = permit;
                        runner.run(message).await;
                    });
                }
                Some(Err(e)) => {
                    warn!(queue = %self.queue, error = %e, "failed to receive job");
                }
                None => {
                    if !shutdown.is_cancelled() {
                        warn!(queue = %self.queue, "broker stream ended");
                    }
                    break;
                }
            }

            while let Some(done) = in_flight.try_join_next() {
                if let Err(e) = done {
                    error!(error = %e, "job task aborted");
                }
            }
        }

        info!(queue = %self.queue, in_flight = in_flight.len(), "worker draining");
        while let Some(done) = in_flight.join_next().await {
            if let Err(e) = done {
                error!(error = %e, "job task aborted");
            }
        }
        info!(queue = %self.queue, "worker stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::JobStream;
    use crate::client::JobQueueClient;
    use crate::memory::MemoryBroker;
    use crate::types::{JobId, JobRequest, JobStatus};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct Echo;

    #[async_trait]
    impl JobExecutor for Echo {
        fn job_type(&self) -> &str {
            "test.echo"
        }

        async fn execute(&self, args: Vec<Value>) -> Result<Value, JobQueueError> {
            Ok(json!({ "args": args }))
        }
    }

    struct Panics;

    #[async_trait]
    impl JobExecutor for Panics {
        fn job_type(&self) -> &str {
            "test.panic"
        }

        async fn execute(&self, _args: Vec<Value>) -> Result<Value, JobQueueError> {
            panic!("executor blew up");
        }
    }

    struct Slow {
        running: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl JobExecutor for Slow {
        fn job_type(&self) -> &str {
            "test.slow"
        }

        async fn execute(&self, _args: Vec<Value>) -> Result<Value, JobQueueError> {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(30)).await;
            self.running.fetch_sub(1, Ordering::SeqCst);
            Ok(Value::Null)
        }
    }

    fn message(job_type: &str, args: Vec<Value>) -> JobMessage {
        JobMessage::new("q", JobRequest::new(job_type, args))
    }

    async fn wait_terminal(client: &JobQueueClient, id: JobId) -> JobRecord {
        for _ in 0..200 {
            if let Some(record) = client.get(id).await.unwrap() {
                if record.status.is_terminal() {
                    return record;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {id} did not finish");
    }

    #[tokio::test]
    async fn process_completes_registered_job() {
        let broker = MemoryBroker::new();
        let mut worker = Worker::new("q", Connection::shared(broker.clone()));
        worker.register_executor(Echo);

        let msg = message("test.echo", vec![json!("x")]);
        let id = msg.id;
        let record = worker.process(msg).await;
        assert_eq!(record.status, JobStatus::Completed);
        assert_eq!(record.result, Some(json!({ "args": ["x"] })));

        let stored = broker.fetch(id).await.unwrap().unwrap();
        assert_eq!(stored, record);
    }

    #[tokio::test]
    async fn unknown_job_type_fails_the_job() {
        let worker = Worker::new("q", Connection::shared(MemoryBroker::new()));
        let record = worker.process(message("test.missing", vec![])).await;
        assert_eq!(record.status, JobStatus::Failed);
        assert!(record
            .error_message
            .unwrap()
            .contains("no executor registered"));
    }

    #[tokio::test]
    async fn panicking_executor_fails_only_its_job() {
        let mut worker = Worker::new("q", Connection::shared(MemoryBroker::new()));
        worker.register_executor(Panics);
        worker.register_executor(Echo);

        let failed = worker.process(message("test.panic", vec![])).await;
        assert_eq!(failed.status, JobStatus::Failed);
        assert_eq!(
            failed.error_message.as_deref(),
            Some("job execution failed: executor panicked")
        );

        let ok = worker.process(message("test.echo", vec![])).await;
        assert_eq!(ok.status, JobStatus::Completed);
    }

    #[tokio::test]
    async fn run_consumes_until_shutdown() {
        let broker = MemoryBroker::new();
        let client = JobQueueClient::new("q", Connection::shared(broker.clone()));
        let mut worker = Worker::new("q", Connection::shared(broker.clone())).with_concurrency(2);
        worker.register_executor(Echo);
        assert_eq!(worker.job_types(), vec!["test.echo"]);

        let shutdown = CancellationToken::new();
        let handle = {
            let shutdown = shutdown.clone();
            tokio::spawn(async move { worker.run(shutdown).await })
        };

        let id = client.submit("test.echo", vec![json!(1)]).await.unwrap();
        let record = wait_terminal(&client, id).await;
        assert_eq!(record.status, JobStatus::Completed);

        shutdown.cancel();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn concurrency_limit_is_respected() {
        let broker = MemoryBroker::new();
        let client = JobQueueClient::new("q", Connection::shared(broker.clone()));
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut worker = Worker::new("q", Connection::shared(broker.clone())).with_concurrency(2);
        worker.register_executor(Slow {
            running: running.clone(),
            peak: peak.clone(),
        });

        let mut ids = Vec::new();
        for _ in 0..6 {
            ids.push(client.submit("test.slow", vec![]).await.unwrap());
        }

        let shutdown = CancellationToken::new();
        let handle = {
            let shutdown = shutdown.clone();
            tokio::spawn(async move { worker.run(shutdown).await })
        };

        for id in ids {
            assert_eq!(wait_terminal(&client, id).await.status, JobStatus::Completed);
        }
        shutdown.cancel();
        handle.await.unwrap().unwrap();

        let peak = peak.load(Ordering::SeqCst);
        assert!((1..=2).contains(&peak), "peak concurrency was {peak}");
    }

    /// Hands over one message after a delay, regardless of shutdown, like a
    /// pop that is already on the wire.
    struct DelayedDelivery {
        message: std::sync::Mutex<Option<JobMessage>>,
        delay: Duration,
    }

    #[async_trait]
    impl Broker for DelayedDelivery {
        async fn submit(
            &self,
            _queue: &str,
            _request: JobRequest,
        ) -> Result<JobId, JobQueueError> {
            Err(JobQueueError::Unavailable("read-only".to_string()))
        }

        fn subscribe(&self, _queue: &str, _shutdown: CancellationToken) -> JobStream {
            let message = self.message.lock().unwrap().take();
            let delay = self.delay;
            Box::pin(futures::stream::iter(message).then(move |message| async move {
                tokio::time::sleep(delay).await;
                Ok(message)
            }))
        }
    }

    #[tokio::test]
    async fn message_in_flight_at_shutdown_is_still_run() {
        let results = MemoryBroker::new();
        let msg = message("test.echo", vec![json!("late")]);
        let id = msg.id;
        let broker = DelayedDelivery {
            message: std::sync::Mutex::new(Some(msg)),
            delay: Duration::from_millis(50),
        };
        let connection = Connection::new(Arc::new(broker), Arc::new(results.clone()));
        let mut worker = Worker::new("q", connection);
        worker.register_executor(Echo);

        let shutdown = CancellationToken::new();
        let handle = {
            let shutdown = shutdown.clone();
            tokio::spawn(async move { worker.run(shutdown).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        shutdown.cancel();
        handle.await.unwrap().unwrap();

        let record = results.fetch(id).await.unwrap().expect("record");
        assert_eq!(record.status, JobStatus::Completed);
    }
}
