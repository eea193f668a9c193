//! Core types for the job queue system.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Opaque job identifier assigned by the broker at submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    #[inline]
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    #[inline]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for JobId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A named job with positional arguments, as handed to [`Broker::submit`](crate::Broker::submit).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRequest {
    pub job_type: String,
    pub args: Vec<Value>,
}

impl JobRequest {
    #[inline]
    pub fn new(job_type: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            job_type: job_type.into(),
            args,
        }
    }
}

/// The envelope that travels through the broker queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobMessage {
    pub id: JobId,
    #[serde(rename = "task")]
    pub job_type: String,
    #[serde(default)]
    pub args: Vec<Value>,
    pub queue: String,
    pub submitted_at: DateTime<Utc>,
}

impl JobMessage {
    /// Wrap a request for `queue` under a freshly assigned id.
    pub fn new(queue: impl Into<String>, request: JobRequest) -> Self {
        Self {
            id: JobId::new_v4(),
            job_type: request.job_type,
            args: request.args,
            queue: queue.into(),
            submitted_at: Utc::now(),
        }
    }
}

/// Status of a job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    /// Returns true if this status represents a terminal state.
    #[inline]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        })
    }
}

/// State of a job as kept in the result backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    #[serde(rename = "task_id")]
    pub id: JobId,
    #[serde(rename = "task")]
    pub job_type: String,
    pub status: JobStatus,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default, rename = "error")]
    pub error_message: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl JobRecord {
    /// Create the pending record written when `message` is enqueued.
    pub fn pending(message: &JobMessage) -> Self {
        Self {
            id: message.id,
            job_type: message.job_type.clone(),
            status: JobStatus::Pending,
            result: None,
            error_message: None,
            updated_at: Utc::now(),
        }
    }

    /// Mark the job as running.
    #[inline]
    pub fn start(&mut self) {
        self.status = JobStatus::Running;
        self.updated_at = Utc::now();
    }

    /// Mark the job as completed with its result.
    #[inline]
    pub fn complete(&mut self, result: Value) {
        self.status = JobStatus::Completed;
        self.result = Some(result);
        self.error_message = None;
        self.updated_at = Utc::now();
    }

    /// Mark the job as failed with an error message.
    #[inline]
    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = JobStatus::Failed;
        self.result = None;
        self.error_message = Some(message.into());
        self.updated_at = Utc::now();
    }
}
