// Application Layer - Use Cases and Orchestration

pub mod constants;
pub mod extractor_registry;
pub mod orchestrator;
pub mod panic_guard;
pub mod registry;
pub mod signal;
pub mod worker;

// Re-exports
pub use extractor_registry::ExtractorRegistry;
pub use orchestrator::{OrchestratorConfig, RunOrchestrator, RunOutcome};
pub use registry::{
    job_queue, validate_request, InMemoryJobStore, JobRegistry, JobStats, QueueReceiver,
    QueueSender, ResultLookup,
};
pub use signal::{
    cancel_channel, shutdown_channel, CancelHandle, CancelToken, ShutdownSender, ShutdownToken,
};
pub use worker::{JobProgressSink, Worker};
