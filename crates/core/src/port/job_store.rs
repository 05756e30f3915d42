// Job Store Port (Interface)
//
// Process-lifetime keyed tables for job records and results. The in-memory
// implementation lives in `application::registry::memory_store`; an external
// keyed table can stand in for multi-process deployments.

use crate::domain::{Job, JobId, JobResult, JobStatus};
use crate::error::Result;
use async_trait::async_trait;

/// Store interface for Job records and their results
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert a new job (Conflict if the id already exists)
    async fn insert(&self, job: &Job) -> Result<()>;

    /// Find job by ID (returns an owned snapshot)
    async fn find_by_id(&self, id: &JobId) -> Result<Option<Job>>;

    /// Replace a job record.
    ///
    /// Rejects writes to a record that is already terminal.
    async fn update(&self, job: &Job) -> Result<()>;

    /// Atomically store the result and the Done record, so that a result
    /// is visible if and only if its job is Done.
    async fn commit_success(&self, job: &Job, result: &JobResult) -> Result<()>;

    /// Find the result of a Done job
    async fn find_result(&self, id: &JobId) -> Result<Option<JobResult>>;

    /// Count jobs by status
    async fn count_by_status(&self, status: JobStatus) -> Result<i64>;

    /// Find all jobs by status, oldest first
    async fn find_by_status(&self, status: JobStatus) -> Result<Vec<Job>>;
}
