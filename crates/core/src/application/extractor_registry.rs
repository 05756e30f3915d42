//! Extractor strategy registry
//!
//! Lookup table from (mode, category, source) to an [`Extractor`]. Built once
//! at startup, then shared read-only behind an `Arc`. The detail table is
//! simply the `FetchMode::Detail` slice of the same map.

use crate::domain::{Category, ExtractionRequest, FetchMode, SourceId};
use crate::error::{AppError, Result};
use crate::port::Extractor;
use std::collections::HashMap;
use std::sync::Arc;

type HandlerKey = (FetchMode, Category, SourceId);

#[derive(Default)]
pub struct ExtractorRegistry {
    handlers: HashMap<HandlerKey, Arc<dyn Extractor>>,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the handler for one (mode, category, source) triple
    pub fn register(
        &mut self,
        mode: FetchMode,
        category: impl Into<String>,
        source: impl Into<String>,
        extractor: Arc<dyn Extractor>,
    ) -> &mut Self {
        self.handlers.insert(
            (mode, Category::new(category), SourceId::new(source)),
            extractor,
        );
        self
    }

    /// Builder-style `register`
    pub fn with(
        mut self,
        mode: FetchMode,
        category: impl Into<String>,
        source: impl Into<String>,
        extractor: Arc<dyn Extractor>,
    ) -> Self {
        self.register(mode, category, source, extractor);
        self
    }

    /// Resolve the handler, or fail with `UnsupportedSource`
    pub fn resolve(
        &self,
        mode: FetchMode,
        category: &Category,
        source: &SourceId,
    ) -> Result<Arc<dyn Extractor>> {
        self.handlers
            .get(&(mode, category.clone(), source.clone()))
            .cloned()
            .ok_or_else(|| AppError::UnsupportedSource {
                mode,
                category: category.to_string(),
                source_id: source.to_string(),
            })
    }

    /// Detail handler for the request's (category, source), if any
    pub fn detail_for(&self, request: &ExtractionRequest) -> Option<Arc<dyn Extractor>> {
        self.resolve(FetchMode::Detail, &request.category, &request.source)
            .ok()
    }

    /// Sorted "mode:category/source" labels, for startup logs and stats
    pub fn entries(&self) -> Vec<String> {
        let mut entries: Vec<String> = self
            .handlers
            .keys()
            .map(|(mode, category, source)| format!("{}:{}/{}", mode, category, source))
            .collect();
        entries.sort();
        entries
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
