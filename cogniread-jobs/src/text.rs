//! Text processing job implementation.

use cogniread_job_queue::{async_trait, JobExecutor, JobQueueError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::error::JobError;
use crate::job_types;

/// Result of the worker.process_text job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessTextResult {
    /// Length of the input in characters (Unicode scalar values).
    pub length: usize,
}

/// Extract the single text argument of a worker.process_text job.
fn text_argument(mut args: Vec<Value>) -> Result<String, JobError> {
    if args.len() != 1 {
        return Err(JobError::ArgumentCount {
            expected: 1,
            actual: args.len(),
        });
    }
    serde_json::from_value(args.remove(0))
        .map_err(|e| JobError::InvalidPayload(format!("text must be a string: {}", e)))
}

/// Executor for worker.process_text jobs.
///
/// Measures the submitted text. This is the placeholder for heavier NLP work
/// that should not run inside an API request.
#[derive(Debug, Default)]
pub struct ProcessTextExecutor;

impl ProcessTextExecutor {
    pub fn new() -> Self {
        Self
    }

    pub fn process(text: &str) -> ProcessTextResult {
        ProcessTextResult {
            length: text.chars().count(),
        }
    }
}

#[async_trait]
impl JobExecutor for ProcessTextExecutor {
    fn job_type(&self) -> &str {
        job_types::PROCESS_TEXT
    }

    async fn execute(&self, args: Vec<Value>) -> Result<Value, JobQueueError> {
        let text = text_argument(args)?;
        let result = Self::process(&text);

        info!(length = result.length, "processed text");

        Ok(serde_json::to_value(result)?)
    }
}
