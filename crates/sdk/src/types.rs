//! SDK Request/Response Types
//!
//! Mirrors the JSON-RPC wire types from the api-rpc crate.

use serde::{Deserialize, Serialize};

/// How many items a run produces
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    #[default]
    One,
    List,
    Detail,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pages: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headless: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

/// What to extract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionRequest {
    pub category: String,
    pub source: String,
    pub url: String,
    #[serde(default)]
    pub options: ExtractionOptions,
}

impl ExtractionRequest {
    pub fn new(
        category: impl Into<String>,
        source: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            source: source.into(),
            url: url.into(),
            options: ExtractionOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ExtractionOptions) -> Self {
        self.options = options;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Done,
    Error,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Error)
    }
}

/// Response from submit
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub job_id: String,
    pub status: JobStatus,
    pub progress: u8,
}

/// Job snapshot
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusResponse {
    pub id: String,
    pub status: JobStatus,
    pub progress: u8,
    pub current_step: String,
    pub mode: FetchMode,
    pub created_at: i64,
    #[serde(default)]
    pub started_at: Option<i64>,
    #[serde(default)]
    pub finished_at: Option<i64>,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// Result lookup: `pending` until the job reaches a terminal status
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultResponse {
    pub job_id: String,
    pub status: JobStatus,
    pub pending: bool,
    #[serde(default)]
    pub payload: Option<serde_json::Value>,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_jobs: i64,
    pub queued_jobs: i64,
    pub running_jobs: i64,
    pub done_jobs: i64,
    pub error_jobs: i64,
    pub queue_depth: usize,
    pub uptime_seconds: i64,
    #[serde(default)]
    pub extractors: Vec<String>,
}

/// One event of a streamed run
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum RunEvent {
    Progress {
        message: String,
        percent: u8,
    },
    Data {
        payload: serde_json::Value,
        #[serde(default)]
        index: Option<usize>,
        #[serde(default)]
        total: Option<usize>,
    },
    Error {
        message: String,
    },
    Complete {
        #[serde(default)]
        item_count: Option<usize>,
        #[serde(default)]
        duration_ms: Option<u64>,
    },
}

/// Stream frame: an event stamped with its run id and epoch-ms timestamp
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunFrame {
    pub run_id: String,
    pub timestamp: i64,
    #[serde(flatten)]
    pub event: RunEvent,
}

impl RunFrame {
    pub fn is_terminal(&self) -> bool {
        matches!(self.event, RunEvent::Error { .. } | RunEvent::Complete { .. })
    }
}
