// Worker - single-flight job execution loop
//
// One supervisor task, started once at service initialization, pulls job ids
// from the FIFO queue and runs them strictly one at a time. A job's failure
// (including a panic) is recorded on that job only; the loop moves on.

mod progress_sink;

pub use progress_sink::JobProgressSink;

use crate::application::panic_guard::isolate;
use crate::application::registry::QueueReceiver;
use crate::application::signal::{CancelToken, ShutdownToken};
use crate::application::{RunOrchestrator, RunOutcome};
use crate::domain::{Job, JobId, JobResult, JobStatus};
use crate::error::{AppError, Result};
use crate::port::{JobStore, ResultPersister, TimeProvider};
use std::sync::Arc;
use tracing::{error, info, info_span, warn, Instrument};

pub struct Worker {
    queue: QueueReceiver,
    store: Arc<dyn JobStore>,
    orchestrator: Arc<RunOrchestrator>,
    persister: Arc<dyn ResultPersister>,
    time_provider: Arc<dyn TimeProvider>,
}

impl Worker {
    pub fn new(
        queue: QueueReceiver,
        store: Arc<dyn JobStore>,
        orchestrator: Arc<RunOrchestrator>,
        persister: Arc<dyn ResultPersister>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            queue,
            store,
            orchestrator,
            persister,
            time_provider,
        }
    }

    /// Run worker loop until shutdown or until every queue sender is gone.
    ///
    /// Shutdown is observed between jobs; an in-flight job finishes first.
    pub async fn run(mut self, mut shutdown: ShutdownToken) -> Result<()> {
        info!("Worker started");
        loop {
            if shutdown.is_raised() {
                info!("Worker shutting down");
                break;
            }

            let next = tokio::select! {
                biased;
                _ = shutdown.wait() => {
                    info!("Worker interrupted while idle");
                    break;
                }
                next = self.queue.next() => next,
            };
            let Some(job_id) = next else {
                info!("Job queue closed");
                break;
            };

            if let Err(e) = self.process_job(&job_id).await {
                error!(job_id = %job_id, error = %e, "Worker fault");
                self.fail_quietly(&job_id, format!("Worker fault: {}", e))
                    .await;
            }
        }
        info!(pending = self.queue.depth(), "Worker stopped");
        Ok(())
    }

    /// Execute one queued job to a terminal status
    pub async fn process_job(&self, job_id: &JobId) -> Result<()> {
        let Some(mut job) = self.store.find_by_id(job_id).await? else {
            warn!(job_id = %job_id, "Queued id has no job record, skipping");
            return Ok(());
        };
        if job.status != JobStatus::Queued {
            warn!(job_id = %job_id, status = %job.status, "Job is not queued, skipping");
            return Ok(());
        }

        job.start(self.time_provider.now_millis())?;
        self.store.update(&job).await?;
        info!(job_id = %job.id, mode = %job.mode, url = %job.params.url, "Processing job");

        let orchestrator = Arc::clone(&self.orchestrator);
        let sink = Arc::new(JobProgressSink::new(job.id.clone(), Arc::clone(&self.store)));
        let mode = job.mode;
        let request = job.params.clone();
        let span = info_span!("job", job_id = %job.id);
        let execution = isolate(
            async move {
                orchestrator
                    .run(mode, &request, sink, CancelToken::never())
                    .await
            }
            .instrument(span),
        )
        .await;

        // The progress sink has been writing to the record during the run
        let mut job = self
            .store
            .find_by_id(job_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("job {}", job_id)))?;

        match execution {
            Ok(Ok(outcome)) => self.finish_success(job, outcome).await,
            Ok(Err(e)) => {
                warn!(job_id = %job.id, error = %e, "Job failed");
                job.fail(self.time_provider.now_millis(), e.to_string())?;
                self.store.update(&job).await
            }
            Err(panic_msg) => {
                error!(job_id = %job.id, panic_msg = %panic_msg, "Job panicked");
                job.fail(
                    self.time_provider.now_millis(),
                    format!("Worker fault: {}", panic_msg),
                )?;
                self.store.update(&job).await
            }
        }
    }

    async fn finish_success(&self, mut job: Job, outcome: RunOutcome) -> Result<()> {
        job.complete(self.time_provider.now_millis())?;
        let result = JobResult {
            job_id: job.id.clone(),
            payload: outcome.payload,
        };
        self.store.commit_success(&job, &result).await?;
        info!(
            job_id = %job.id,
            run_id = %outcome.run_id,
            item_count = result.payload.item_count(),
            duration_ms = outcome.duration_ms,
            "Job completed"
        );

        // Forwarding never changes the job's status
        if let Err(e) = self.persister.persist(&job.params, &result.payload).await {
            warn!(job_id = %job.id, error = %e, "Result forwarding failed");
        }
        Ok(())
    }

    /// Best-effort: put a job that faulted mid-processing into error
    async fn fail_quietly(&self, job_id: &JobId, message: String) {
        let Ok(Some(mut job)) = self.store.find_by_id(job_id).await else {
            return;
        };
        if job.status.is_terminal() {
            return;
        }
        if job.fail(self.time_provider.now_millis(), message).is_ok() {
            if let Err(e) = self.store.update(&job).await {
                error!(job_id = %job_id, error = %e, "Failed to record worker fault");
            }
        }
    }
}
