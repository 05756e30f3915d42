// Extractor Capability Port
//
// Per-source logic that turns a loaded resource into structured item(s).
// Extractors are resolved by (mode, category, source) in the
// `ExtractorRegistry`; they never see correlation ids.

use crate::domain::{ExtractedPayload, ExtractionOptions, ExtractionRequest};
use crate::port::{ExecutionContext, RunEmitter};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractorError {
    #[error("{0}")]
    Failed(String),

    #[error("expected element not found: {0}")]
    MissingElement(String),

    #[error("page could not be read: {0}")]
    Page(String),

    #[error("no data extracted")]
    Empty,
}

/// Secondary per-item lookups for list-mode runs.
///
/// Implemented by the orchestrator's enrichment pool: each address is fetched
/// on its own isolated context through the detail handler table.
#[async_trait]
pub trait DetailFetcher: Send + Sync {
    /// Fetch detail items for `urls`, preserving order. A failed lookup yields `None`.
    async fn fetch_details(&self, urls: Vec<String>) -> Vec<Option<serde_json::Value>>;
}

/// Everything an extractor may touch during one run
pub struct ExtractionScope<'a> {
    pub page: &'a dyn ExecutionContext,
    pub request: &'a ExtractionRequest,
    pub emit: &'a RunEmitter,
    /// Present only in list mode
    pub enrichment: Option<&'a dyn DetailFetcher>,
}

impl<'a> ExtractionScope<'a> {
    pub fn url(&self) -> &str {
        &self.request.url
    }

    pub fn options(&self) -> &ExtractionOptions {
        &self.request.options
    }
}

#[async_trait]
pub trait Extractor: Send + Sync {
    /// Extract item(s) from the already-loaded page
    async fn extract(&self, scope: &ExtractionScope<'_>)
        -> Result<ExtractedPayload, ExtractorError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Mock extractor behavior
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Return this payload
        Return(ExtractedPayload),
        /// Stream each item as a data event, then return them all
        Stream(Vec<serde_json::Value>),
        /// Raise an error after emitting one progress event
        Fail(String),
        /// Return an empty collection
        Empty,
        /// Panic (for worker isolation testing)
        Panic(String),
        /// Sleep, then return the payload
        Slow(Duration, ExtractedPayload),
        /// Return the page's links as items after enriching them via the detail table
        Enrich(Vec<String>),
    }

    pub struct MockExtractor {
        behavior: MockBehavior,
        calls: AtomicUsize,
    }

    impl MockExtractor {
        pub fn new(behavior: MockBehavior) -> Self {
            Self {
                behavior,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn returning(value: serde_json::Value) -> Self {
            Self::new(MockBehavior::Return(ExtractedPayload::Single(value)))
        }

        pub fn failing(message: impl Into<String>) -> Self {
            Self::new(MockBehavior::Fail(message.into()))
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Extractor for MockExtractor {
        async fn extract(
            &self,
            scope: &ExtractionScope<'_>,
        ) -> Result<ExtractedPayload, ExtractorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);

            match &self.behavior {
                MockBehavior::Return(payload) => Ok(payload.clone()),
                MockBehavior::Stream(items) => {
                    let total = items.len();
                    for (i, item) in items.iter().enumerate() {
                        scope.emit.data_at(item.clone(), i, total).await;
                    }
                    Ok(ExtractedPayload::Many(items.clone()))
                }
                MockBehavior::Fail(msg) => {
                    scope.emit.progress("Reading page", 60).await;
                    Err(ExtractorError::Failed(msg.clone()))
                }
                MockBehavior::Empty => Ok(ExtractedPayload::Many(Vec::new())),
                MockBehavior::Panic(msg) => panic!("{}", msg),
                MockBehavior::Slow(delay, payload) => {
                    tokio::time::sleep(*delay).await;
                    Ok(payload.clone())
                }
                MockBehavior::Enrich(links) => {
                    let fetcher = scope
                        .enrichment
                        .ok_or_else(|| ExtractorError::Failed("no enrichment pool".into()))?;
                    let details = fetcher.fetch_details(links.clone()).await;
                    let items = links
                        .iter()
                        .zip(details)
                        .map(|(url, detail)| serde_json::json!({"url": url, "detail": detail}))
                        .collect();
                    Ok(ExtractedPayload::Many(items))
                }
            }
        }
    }
}
