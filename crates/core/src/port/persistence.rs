// Persistence Capability Port
//
// Forwards a successful result to a downstream storage service. Invoked once
// per successful run, after the run's duration has been measured.

use crate::domain::{ExtractedPayload, ExtractionRequest};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("Downstream rejected result: HTTP {0}")]
    Rejected(u16),

    #[error("Downstream unreachable: {0}")]
    Unreachable(String),

    #[error("Encoding failed: {0}")]
    Encoding(String),
}

#[async_trait]
pub trait ResultPersister: Send + Sync {
    async fn persist(
        &self,
        request: &ExtractionRequest,
        payload: &ExtractedPayload,
    ) -> Result<(), PersistError>;
}

/// Persister used when no downstream is configured
pub struct NoopPersister;

#[async_trait]
impl ResultPersister for NoopPersister {
    async fn persist(
        &self,
        _request: &ExtractionRequest,
        _payload: &ExtractedPayload,
    ) -> Result<(), PersistError> {
        Ok(())
    }
}

pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    /// Records every persisted (request, payload) pair
    #[derive(Default)]
    pub struct RecordingPersister {
        calls: Mutex<Vec<(ExtractionRequest, ExtractedPayload)>>,
        fail: bool,
    }

    impl RecordingPersister {
        pub fn new() -> Self {
            Self::default()
        }

        /// Records the call, then fails it
        pub fn failing() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        pub fn calls(&self) -> Vec<(ExtractionRequest, ExtractedPayload)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ResultPersister for RecordingPersister {
        async fn persist(
            &self,
            request: &ExtractionRequest,
            payload: &ExtractedPayload,
        ) -> Result<(), PersistError> {
            self.calls
                .lock()
                .unwrap()
                .push((request.clone(), payload.clone()));
            if self.fail {
                return Err(PersistError::Unreachable("mock downstream down".to_string()));
            }
            Ok(())
        }
    }
}
