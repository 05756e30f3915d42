// Job Registry - submission, lookup and queue bookkeeping
//
// An explicitly constructed, owned registry handle: create it once at
// startup and share it behind an `Arc`. Only the worker mutates job records
// after submission.

mod memory_store;
mod queue;
pub mod submit;

pub use memory_store::InMemoryJobStore;
pub use queue::{job_queue, QueueReceiver, QueueSender};
pub use submit::validate_request;

use crate::domain::{ExtractedPayload, ExtractionRequest, FetchMode, Job, JobId, JobResult, JobStatus};
use crate::error::{AppError, Result};
use crate::port::{IdProvider, JobStore, TimeProvider};
use serde::Serialize;
use std::sync::Arc;

/// Poll-result view of one job
#[derive(Debug, Clone, PartialEq)]
pub enum ResultLookup {
    /// Job is done; the stored payload
    Ready(ExtractedPayload),
    /// Job is still queued or running
    Pending(JobStatus),
    /// Job ended in error; the captured message
    Failed(String),
    NotFound,
}

/// Registry counters (admin view)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStats {
    pub queued: i64,
    pub running: i64,
    pub done: i64,
    pub error: i64,
    pub queue_depth: usize,
    pub uptime_ms: i64,
}

pub struct JobRegistry {
    store: Arc<dyn JobStore>,
    queue: QueueSender,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
    started_at: i64,
}

impl JobRegistry {
    pub fn new(
        store: Arc<dyn JobStore>,
        queue: QueueSender,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        let started_at = time_provider.now_millis();
        Self {
            store,
            queue,
            id_provider,
            time_provider,
            started_at,
        }
    }

    /// Submit a single-item extraction. Returns the queued snapshot immediately.
    pub async fn submit(&self, request: ExtractionRequest) -> Result<Job> {
        self.submit_with_mode(request, FetchMode::One).await
    }

    /// Submit through a specific handler table
    pub async fn submit_with_mode(&self, request: ExtractionRequest, mode: FetchMode) -> Result<Job> {
        submit::execute(
            self.store.as_ref(),
            &self.queue,
            self.id_provider.as_ref(),
            self.time_provider.as_ref(),
            request,
            mode,
        )
        .await
    }

    /// Snapshot of a job record; `None` for unknown ids
    pub async fn get_job(&self, id: &JobId) -> Result<Option<Job>> {
        self.store.find_by_id(id).await
    }

    /// Stored result; defined only once the job is done
    pub async fn get_result(&self, id: &JobId) -> Result<Option<JobResult>> {
        self.store.find_result(id).await
    }

    pub async fn lookup_result(&self, id: &JobId) -> Result<ResultLookup> {
        let Some(job) = self.store.find_by_id(id).await? else {
            return Ok(ResultLookup::NotFound);
        };

        match job.status {
            JobStatus::Queued | JobStatus::Running => Ok(ResultLookup::Pending(job.status)),
            JobStatus::Error => Ok(ResultLookup::Failed(job.error_message.unwrap_or_default())),
            JobStatus::Done => self
                .store
                .find_result(id)
                .await?
                .map(|result| ResultLookup::Ready(result.payload))
                .ok_or_else(|| AppError::Internal(format!("job {} is done but has no result", id))),
        }
    }

    pub async fn stats(&self) -> Result<JobStats> {
        Ok(JobStats {
            queued: self.store.count_by_status(JobStatus::Queued).await?,
            running: self.store.count_by_status(JobStatus::Running).await?,
            done: self.store.count_by_status(JobStatus::Done).await?,
            error: self.store.count_by_status(JobStatus::Error).await?,
            queue_depth: self.queue.depth(),
            uptime_ms: self.time_provider.now_millis() - self.started_at,
        })
    }
}
