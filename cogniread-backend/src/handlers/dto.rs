use cogniread_job_queue::JobId;
use serde::{Deserialize, Serialize};

use crate::validation::{check_char_length, check_item_count, ValidationIssue};

pub const MAX_TEXT_CHARS: usize = 20_000;
pub const MAX_INGEST_TEXTS: usize = 200;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct EmbedRequest {
    pub text: String,
}

impl EmbedRequest {
    pub fn validate(&self) -> Result<(), Vec<ValidationIssue>> {
        let mut issues = Vec::new();
        check_char_length("text", &self.text, 1, MAX_TEXT_CHARS, &mut issues);
        if issues.is_empty() {
            Ok(())
        } else {
            Err(issues)
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EmbedResponse {
    pub embedding: Vec<f64>,
    pub dim: usize,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct IngestRequest {
    pub texts: Vec<String>,
}

impl IngestRequest {
    pub fn validate(&self) -> Result<(), Vec<ValidationIssue>> {
        let mut issues = Vec::new();
        check_item_count("texts", self.texts.len(), 1, MAX_INGEST_TEXTS, &mut issues);
        if issues.is_empty() {
            Ok(())
        } else {
            Err(issues)
        }
    }

    /// Texts that produce a job; empty strings are skipped.
    pub fn submittable(&self) -> impl Iterator<Item = &str> {
        self.texts.iter().map(String::as_str).filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IngestResponse {
    pub task_ids: Vec<JobId>,
}
