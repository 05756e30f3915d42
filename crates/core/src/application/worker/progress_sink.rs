// EventSink adapter folding one run's events into its job record

use crate::domain::{JobId, RunEnvelope, RunEvent, STEP_FAILED};
use crate::port::{EventSink, JobStore};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct JobProgressSink {
    job_id: JobId,
    store: Arc<dyn JobStore>,
}

impl JobProgressSink {
    pub fn new(job_id: JobId, store: Arc<dyn JobStore>) -> Self {
        Self { job_id, store }
    }

    async fn fold(&self, event: &RunEvent) -> crate::error::Result<()> {
        let Some(mut job) = self.store.find_by_id(&self.job_id).await? else {
            return Ok(());
        };

        match event {
            RunEvent::Progress { message, percent } => job.record_progress(*percent, message.as_str())?,
            RunEvent::Data { index, total, .. } => match (index, total) {
                (Some(i), Some(n)) => job.record_step(format!("Received item {}/{}", i + 1, n))?,
                _ => return Ok(()),
            },
            RunEvent::Error { .. } => job.record_step(STEP_FAILED)?,
            // Done is only reachable through commit_success
            RunEvent::Complete { .. } => return Ok(()),
        }
        self.store.update(&job).await
    }
}

#[async_trait]
impl EventSink for JobProgressSink {
    async fn deliver(&self, envelope: RunEnvelope) {
        debug!(
            job_id = %self.job_id,
            run_id = %envelope.run_id,
            kind = envelope.event.kind(),
            "Run event"
        );
        if let Err(e) = self.fold(&envelope.event).await {
            warn!(job_id = %self.job_id, error = %e, "Failed to fold run event into job");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::InMemoryJobStore;
    use crate::domain::{ExtractionRequest, Job, JobStatus, RunId};

    async fn running_job(store: &InMemoryJobStore) -> Job {
        let mut job = Job::new(
            "job-1",
            1_000,
            ExtractionRequest::new("web", "generic", "https://example.com"),
        );
        store.insert(&job).await.unwrap();
        job.start(2_000).unwrap();
        store.update(&job).await.unwrap();
        job
    }

    fn envelope(event: RunEvent) -> RunEnvelope {
        RunEnvelope {
            run_id: RunId::new("run-1"),
            timestamp: 0,
            event,
        }
    }

    #[tokio::test]
    async fn test_progress_folds_into_record() {
        let store = Arc::new(InMemoryJobStore::new());
        let job = running_job(&store).await;
        let sink = JobProgressSink::new(job.id.clone(), store.clone());

        sink.deliver(envelope(RunEvent::progress("Navigating to target", 10)))
            .await;
        sink.deliver(envelope(RunEvent::progress("Extracting content", 50)))
            .await;

        let stored = store.find_by_id(&job.id).await.unwrap().unwrap();
        assert_eq!(stored.progress, 50);
        assert_eq!(stored.current_step, "Extracting content");
        assert_eq!(stored.status, JobStatus::Running);
    }

    #[tokio::test]
    async fn test_indexed_data_updates_step_only() {
        let store = Arc::new(InMemoryJobStore::new());
        let job = running_job(&store).await;
        let sink = JobProgressSink::new(job.id.clone(), store.clone());

        sink.deliver(envelope(RunEvent::progress("Extracting content", 50)))
            .await;
        sink.deliver(envelope(RunEvent::data_at(serde_json::json!({}), 1, 3)))
            .await;

        let stored = store.find_by_id(&job.id).await.unwrap().unwrap();
        assert_eq!(stored.progress, 50);
        assert_eq!(stored.current_step, "Received item 2/3");
    }

    #[tokio::test]
    async fn test_events_after_terminal_are_ignored() {
        let store = Arc::new(InMemoryJobStore::new());
        let mut job = running_job(&store).await;
        job.fail(3_000, "boom").unwrap();
        store.update(&job).await.unwrap();

        let sink = JobProgressSink::new(job.id.clone(), store.clone());
        sink.deliver(envelope(RunEvent::progress("late", 90))).await;

        let stored = store.find_by_id(&job.id).await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Error);
        assert_eq!(stored.progress, 0);
    }
}
