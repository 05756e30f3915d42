//! RPC Request/Response Types
//!
//! JSON-RPC method parameters and results. Field names are camelCase on the wire.

use extracta_core::application::{JobStats, ResultLookup};
use extracta_core::domain::{ExtractedPayload, ExtractionRequest, FetchMode, Job, JobStatus};
use serde::{Deserialize, Serialize};

/// extract.submit.v1 - Submit an extraction job
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub request: ExtractionRequest,
    #[serde(default)]
    pub mode: FetchMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub job_id: String,
    pub status: JobStatus,
    pub progress: u8,
}

/// extract.status.v1 / extract.result.v1
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobIdRequest {
    pub job_id: String,
}

/// extract.status.v1 - Job snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusResponse {
    pub id: String,
    pub status: JobStatus,
    pub progress: u8,
    pub current_step: String,
    pub mode: FetchMode,
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl From<Job> for JobStatusResponse {
    fn from(job: Job) -> Self {
        Self {
            id: job.id,
            status: job.status,
            progress: job.progress,
            current_step: job.current_step,
            mode: job.mode,
            created_at: job.created_at,
            started_at: job.started_at,
            finished_at: job.finished_at,
            error_message: job.error_message,
        }
    }
}

/// extract.result.v1 - Result view
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultResponse {
    pub job_id: String,
    pub status: JobStatus,
    /// True while the job is queued or running
    pub pending: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<ExtractedPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ResultResponse {
    /// `None` for `ResultLookup::NotFound`
    pub fn from_lookup(job_id: String, lookup: ResultLookup) -> Option<Self> {
        let response = match lookup {
            ResultLookup::Ready(payload) => Self {
                job_id,
                status: JobStatus::Done,
                pending: false,
                payload: Some(payload),
                error_message: None,
            },
            ResultLookup::Pending(status) => Self {
                job_id,
                status,
                pending: true,
                payload: None,
                error_message: None,
            },
            ResultLookup::Failed(message) => Self {
                job_id,
                status: JobStatus::Error,
                pending: false,
                payload: None,
                error_message: Some(message),
            },
            ResultLookup::NotFound => return None,
        };
        Some(response)
    }
}

/// admin.stats.v1 - Get system statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_jobs: i64,
    pub queued_jobs: i64,
    pub running_jobs: i64,
    pub done_jobs: i64,
    pub error_jobs: i64,
    pub queue_depth: usize,
    pub uptime_seconds: i64,
    /// Registered "mode:category/source" handlers
    pub extractors: Vec<String>,
}

impl StatsResponse {
    pub fn new(stats: JobStats, extractors: Vec<String>) -> Self {
        Self {
            total_jobs: stats.queued + stats.running + stats.done + stats.error,
            queued_jobs: stats.queued,
            running_jobs: stats.running,
            done_jobs: stats.done,
            error_jobs: stats.error,
            queue_depth: stats.queue_depth,
            uptime_seconds: stats.uptime_ms / 1000,
            extractors,
        }
    }
}

/// extract.subscribe.v1 - Open one run and stream its events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRequest {
    #[serde(default)]
    pub mode: FetchMode,
    pub request: ExtractionRequest,
}
