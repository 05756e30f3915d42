//! Shared wiring for the cross-crate tests: the full in-process stack with
//! mock execution contexts and a recording persister.

#![allow(dead_code)]

use extracta_core::application::{
    job_queue, shutdown_channel, ExtractorRegistry, InMemoryJobStore, JobRegistry,
    OrchestratorConfig, QueueReceiver, RunOrchestrator, ShutdownSender, Worker,
};
use extracta_core::domain::{ExtractedPayload, ExtractionRequest, FetchMode, Job, JobId};
use extracta_core::port::execution_context::mocks::MockContextProvider;
use extracta_core::port::extractor::mocks::{MockBehavior, MockExtractor};
use extracta_core::port::id_provider::UuidProvider;
use extracta_core::port::persistence::mocks::RecordingPersister;
use extracta_core::port::time_provider::SystemTimeProvider;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

pub const CATEGORY: &str = "web";
pub const SOURCE: &str = "generic";

pub struct Stack {
    pub registry: Arc<JobRegistry>,
    pub store: Arc<InMemoryJobStore>,
    pub orchestrator: Arc<RunOrchestrator>,
    pub contexts: Arc<MockContextProvider>,
    pub persister: Arc<RecordingPersister>,
    shutdown: ShutdownSender,
    worker: Option<JoinHandle<()>>,
    // Held while no worker drains the queue
    parked: Option<QueueReceiver>,
}

impl Stack {
    /// Full stack with a running worker
    pub fn start(extractors: ExtractorRegistry) -> Self {
        Self::build(extractors, true)
    }

    /// Registry and queue only: submitted jobs stay queued
    pub fn idle(extractors: ExtractorRegistry) -> Self {
        Self::build(extractors, false)
    }

    fn build(extractors: ExtractorRegistry, with_worker: bool) -> Self {
        let store = Arc::new(InMemoryJobStore::new());
        let contexts = Arc::new(MockContextProvider::serving("<html><body>ok</body></html>"));
        let persister = Arc::new(RecordingPersister::new());
        let (queue_tx, queue_rx) = job_queue();

        let orchestrator = Arc::new(RunOrchestrator::new(
            Arc::new(extractors),
            contexts.clone(),
            Arc::new(UuidProvider),
            Arc::new(SystemTimeProvider),
            OrchestratorConfig {
                settle_delay: Duration::ZERO,
                ..OrchestratorConfig::default()
            },
        ));
        let registry = Arc::new(JobRegistry::new(
            store.clone(),
            queue_tx,
            Arc::new(UuidProvider),
            Arc::new(SystemTimeProvider),
        ));

        let (shutdown, shutdown_rx) = shutdown_channel();
        let (worker, parked) = if with_worker {
            let worker = Worker::new(
                queue_rx,
                store.clone(),
                orchestrator.clone(),
                persister.clone(),
                Arc::new(SystemTimeProvider),
            );
            let handle = tokio::spawn(async move {
                let _ = worker.run(shutdown_rx).await;
            });
            (Some(handle), None)
        } else {
            (None, Some(queue_rx))
        };

        Self {
            registry,
            store,
            orchestrator,
            contexts,
            persister,
            shutdown,
            worker,
            parked,
        }
    }

    pub async fn job(&self, id: &JobId) -> Job {
        self.registry
            .get_job(id)
            .await
            .unwrap()
            .unwrap_or_else(|| panic!("job {} missing", id))
    }

    /// Poll until the job reaches done or error
    pub async fn wait_terminal(&self, id: &JobId) -> Job {
        tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                let job = self.job(id).await;
                if job.status.is_terminal() {
                    return job;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("job {} never finished", id))
    }

    pub async fn stop(mut self) {
        self.shutdown.raise();
        if let Some(worker) = self.worker.take() {
            let _ = tokio::time::timeout(Duration::from_secs(5), worker).await;
        }
    }
}

pub fn request(source: &str) -> ExtractionRequest {
    ExtractionRequest::new(CATEGORY, source, "https://example.com/item")
}

pub fn request_for(url: &str) -> ExtractionRequest {
    ExtractionRequest::new(CATEGORY, SOURCE, url)
}

/// web/generic single-item extractor with the given behavior
pub fn single(behavior: MockBehavior) -> ExtractorRegistry {
    ExtractorRegistry::new().with(
        FetchMode::One,
        CATEGORY,
        SOURCE,
        Arc::new(MockExtractor::new(behavior)),
    )
}

pub fn item() -> ExtractedPayload {
    ExtractedPayload::Single(json!({"title": "Item", "price": 12}))
}
