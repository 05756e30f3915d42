// Port Layer - Interfaces for external dependencies

pub mod event_sink;
pub mod execution_context;
pub mod extractor;
pub mod id_provider; // For deterministic testing
pub mod job_store;
pub mod persistence;
pub mod time_provider;

// Re-exports
pub use event_sink::{EventSink, NullSink, RunEmitter};
pub use execution_context::{
    ContextOptions, ContextProvider, ExecutionContext, NavigationError, WaitUntil,
};
pub use extractor::{DetailFetcher, ExtractionScope, Extractor, ExtractorError};
pub use id_provider::IdProvider;
pub use job_store::JobStore;
pub use persistence::{NoopPersister, PersistError, ResultPersister};
pub use time_provider::TimeProvider;
