// Extraction Request Domain Model
//
// The request is consumed, never owned: it travels unchanged from the caller
// through the job record into the extractor.

use serde::{Deserialize, Serialize};

/// Content category (e.g. "restaurant", "hotel", "web")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source identifier within a category (e.g. "generic", "maps")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(String);

impl SourceId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which handler table a run is dispatched through
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    /// Single item from one address
    #[default]
    One,
    /// Collection of items discovered at one address
    List,
    /// Single item through the alternate "detail" handler table
    Detail,
}

impl std::fmt::Display for FetchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchMode::One => write!(f, "one"),
            FetchMode::List => write!(f, "list"),
            FetchMode::Detail => write!(f, "detail"),
        }
    }
}

/// Optional tuning parameters, passed through to the extractor untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionOptions {
    /// Overall run timeout in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    /// Page budget for list-mode runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pages: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headless: Option<bool>,

    /// BCP-47-ish locale tag, e.g. "en-US"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

/// Extraction request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionRequest {
    pub category: Category,
    pub source: SourceId,
    /// Target address of the resource to render
    pub url: String,
    #[serde(default)]
    pub options: ExtractionOptions,
}

impl ExtractionRequest {
    pub fn new(
        category: impl Into<String>,
        source: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            category: Category::new(category),
            source: SourceId::new(source),
            url: url.into(),
            options: ExtractionOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ExtractionOptions) -> Self {
        self.options = options;
        self
    }
}
