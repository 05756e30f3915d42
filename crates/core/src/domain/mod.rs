// Domain Layer - Pure business logic and entities

pub mod error;
pub mod event;
pub mod job;
pub mod payload;
pub mod request;
pub mod run;

// Re-exports
pub use error::DomainError;
pub use event::{RunEnvelope, RunEvent, RunId};
pub use job::{Job, JobId, JobStatus, STEP_COMPLETED, STEP_FAILED, STEP_INITIALIZING};
pub use payload::{ExtractedPayload, JobResult};
pub use request::{Category, ExtractionOptions, ExtractionRequest, FetchMode, SourceId};
pub use run::RunPhase;
