// In-memory JobStore
//
// Process-lifetime tables for job records and results. Records are never
// deleted. Every read hands out an owned clone, so callers never observe
// later mutations through an earlier snapshot.

use crate::domain::{Job, JobId, JobResult, JobStatus};
use crate::error::{AppError, Result};
use crate::port::JobStore;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct Tables {
    jobs: HashMap<JobId, Job>,
    results: HashMap<JobId, JobResult>,
    /// Insertion order, for oldest-first listings
    order: Vec<JobId>,
}

#[derive(Default)]
pub struct InMemoryJobStore {
    tables: RwLock<Tables>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn rank(status: JobStatus) -> u8 {
    match status {
        JobStatus::Queued => 0,
        JobStatus::Running => 1,
        JobStatus::Done | JobStatus::Error => 2,
    }
}

/// Reject writes that would break monotonic status transitions
fn check_transition(current: &Job, next: &Job) -> Result<()> {
    if current.status.is_terminal() {
        return Err(AppError::InvalidState(format!(
            "job {} is already {}",
            current.id, current.status
        )));
    }
    if rank(next.status) < rank(current.status) {
        return Err(AppError::InvalidState(format!(
            "job {} cannot move from {} back to {}",
            current.id, current.status, next.status
        )));
    }
    if next.params != current.params {
        return Err(AppError::InvalidState(format!(
            "job {} params are immutable",
            current.id
        )));
    }
    Ok(())
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn insert(&self, job: &Job) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.jobs.contains_key(&job.id) {
            return Err(AppError::Conflict(format!("job {} already exists", job.id)));
        }
        tables.order.push(job.id.clone());
        tables.jobs.insert(job.id.clone(), job.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &JobId) -> Result<Option<Job>> {
        Ok(self.tables.read().await.jobs.get(id).cloned())
    }

    async fn update(&self, job: &Job) -> Result<()> {
        let mut tables = self.tables.write().await;
        let current = tables
            .jobs
            .get(&job.id)
            .ok_or_else(|| AppError::NotFound(format!("job {}", job.id)))?;
        check_transition(current, job)?;
        if job.status == JobStatus::Done {
            return Err(AppError::InvalidState(format!(
                "job {} can only reach done together with its result",
                job.id
            )));
        }
        tables.jobs.insert(job.id.clone(), job.clone());
        Ok(())
    }

    async fn commit_success(&self, job: &Job, result: &JobResult) -> Result<()> {
        if job.status != JobStatus::Done || result.job_id != job.id {
            return Err(AppError::InvalidState(format!(
                "result commit for job {} requires a done record with a matching result",
                job.id
            )));
        }

        let mut tables = self.tables.write().await;
        let current = tables
            .jobs
            .get(&job.id)
            .ok_or_else(|| AppError::NotFound(format!("job {}", job.id)))?;
        check_transition(current, job)?;

        tables.results.insert(job.id.clone(), result.clone());
        tables.jobs.insert(job.id.clone(), job.clone());
        Ok(())
    }

    async fn find_result(&self, id: &JobId) -> Result<Option<JobResult>> {
        Ok(self.tables.read().await.results.get(id).cloned())
    }

    async fn count_by_status(&self, status: JobStatus) -> Result<i64> {
        let tables = self.tables.read().await;
        Ok(tables.jobs.values().filter(|j| j.status == status).count() as i64)
    }

    async fn find_by_status(&self, status: JobStatus) -> Result<Vec<Job>> {
        let tables = self.tables.read().await;
        Ok(tables
            .order
            .iter()
            .filter_map(|id| tables.jobs.get(id))
            .filter(|j| j.status == status)
            .cloned()
            .collect())
    }
}
