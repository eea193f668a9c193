//! Concrete job implementations for the CogniRead worker.
//!
//! This crate provides implementations of the [`JobExecutor`](cogniread_job_queue::JobExecutor)
//! trait for the job types the API submits.
//!
//! # Job Types
//!
//! - `worker.process_text` - Measure a text; result `{"length": <chars>}`
//!
//! # Usage
//!
//! ```rust,no_run
//! use cogniread_job_queue::{connect, ConnectOptions, Worker};
//! use cogniread_jobs::register_all_executors;
//!
//! let connection = connect("memory://", ConnectOptions::default()).unwrap();
//! let mut worker = Worker::new("ai-tasks", connection);
//! register_all_executors(&mut worker);
//! ```

mod error;
mod text;

pub use error::JobError;
pub use text::{ProcessTextExecutor, ProcessTextResult};

use cogniread_job_queue::Worker;

/// Register all available job executors with the worker.
pub fn register_all_executors(worker: &mut Worker) {
    worker.register_executor(ProcessTextExecutor::new());
}

/// Job type constants for type-safe job references.
pub mod job_types {
    pub const PROCESS_TEXT: &str = "worker.process_text";
}
