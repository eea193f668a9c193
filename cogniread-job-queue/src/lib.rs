//! Job queue abstraction shared by the CogniRead API and worker.
//!
//! Producers submit named jobs to a queue on a shared broker and get an id
//! back immediately; workers subscribe to the same queue, run the matching
//! executor and publish the outcome to the result backend keyed by that id.
//!
//! # Architecture
//!
//! - [`Broker`] / [`ResultBackend`] - the narrow seam to the queue technology
//! - [`MemoryBroker`] - process-local implementation of both
//! - [`RedisBroker`] - Redis implementation of both
//! - [`JobQueueClient`] - submits jobs and looks up their records
//! - [`Worker`] - consumes a queue with a bounded pool of job tasks
//! - [`JobExecutor`] - trait for implementing job handlers
//!
//! # Example
//!
//! ```rust,no_run
//! use cogniread_job_queue::{
//!     async_trait, connect, ConnectOptions, JobExecutor, JobQueueClient, JobQueueError, Worker,
//! };
//! use serde_json::{json, Value};
//! use tokio_util::sync::CancellationToken;
//!
//! struct Shout;
//!
//! #[async_trait]
//! impl JobExecutor for Shout {
//!     fn job_type(&self) -> &str {
//!         "demo.shout"
//!     }
//!
//!     async fn execute(&self, args: Vec<Value>) -> Result<Value, JobQueueError> {
//!         let text = args.first().and_then(Value::as_str).unwrap_or_default();
//!         Ok(json!({ "text": text.to_uppercase() }))
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), JobQueueError> {
//!     let connection = connect("memory://", ConnectOptions::default())?;
//!
//!     let mut worker = Worker::new("demo", connection.clone());
//!     worker.register_executor(Shout);
//!     let shutdown = CancellationToken::new();
//!     tokio::spawn({
//!         let shutdown = shutdown.clone();
//!         async move { worker.run(shutdown).await }
//!     });
//!
//!     let client = JobQueueClient::new("demo", connection);
//!     let id = client.submit("demo.shout", vec![json!("hello")]).await?;
//!     println!("submitted {id}");
//!     Ok(())
//! }
//! ```

mod broker;
mod client;
mod error;
mod executor;
mod memory;
mod redis_broker;
mod types;
mod worker;

pub use broker::{
    connect, is_in_process, Broker, ConnectOptions, Connection, JobStream, ResultBackend,
};
pub use client::JobQueueClient;
pub use error::JobQueueError;
pub use executor::JobExecutor;
pub use memory::MemoryBroker;
pub use redis_broker::RedisBroker;
pub use types::{JobId, JobMessage, JobRecord, JobRequest, JobStatus};
pub use worker::Worker;

// Re-export async_trait for convenience when implementing JobExecutor
pub use async_trait::async_trait;
