// Execution Context Port
//
// An execution context is an isolated session (own cookies/storage) used by
// exactly one run. Contexts are acquired per run and released on every exit
// path; they are never shared between runs.

use crate::domain::ExtractionRequest;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Navigation readiness signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitUntil {
    /// Document structure parsed (fast, preferred)
    DomContentLoaded,
    /// All subresources loaded
    Load,
    /// No network activity for a quiet period (slow, unbounded on busy pages)
    NetworkIdle,
}

/// Per-context launch options derived from the request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextOptions {
    pub headless: bool,
    pub locale: Option<String>,
}

impl ContextOptions {
    pub fn from_request(request: &ExtractionRequest) -> Self {
        Self {
            headless: request.options.headless.unwrap_or(true),
            locale: request.options.locale.clone(),
        }
    }
}

#[derive(Error, Debug)]
pub enum NavigationError {
    #[error("Context launch failed: {0}")]
    Launch(String),

    #[error("Navigation to {url} timed out after {timeout_ms} ms")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("HTTP {status} for {url}")]
    Http { url: String, status: u16 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Nothing loaded in this context yet")]
    NotLoaded,
}

/// Allocates fresh isolated contexts
#[async_trait]
pub trait ContextProvider: Send + Sync {
    async fn acquire(
        &self,
        options: &ContextOptions,
    ) -> Result<Box<dyn ExecutionContext>, NavigationError>;
}

/// One isolated rendering session
#[async_trait]
pub trait ExecutionContext: Send + Sync {
    /// Stable identifier, for logs
    fn id(&self) -> &str;

    /// Navigate and wait for the given readiness signal, bounded by `timeout`
    async fn goto(
        &self,
        url: &str,
        wait: WaitUntil,
        timeout: Duration,
    ) -> Result<(), NavigationError>;

    /// Address after redirects, if something is loaded
    fn current_url(&self) -> Option<String>;

    /// Current document markup
    async fn content(&self) -> Result<String, NavigationError>;

    /// Tear the context down. Consumes the context.
    async fn release(self: Box<Self>);
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Mock navigation behavior
    #[derive(Debug, Clone)]
    pub enum MockPageBehavior {
        /// Navigation succeeds and the page serves this markup
        Serve(String),
        /// Navigation fails with HTTP status
        HttpError(u16),
        /// Navigation never signals readiness (exercises timeouts)
        Hang,
    }

    #[derive(Default)]
    struct Counters {
        acquired: AtomicUsize,
        released: AtomicUsize,
        open: AtomicUsize,
        max_open: AtomicUsize,
    }

    /// Provider that hands out in-memory pages and counts allocations
    pub struct MockContextProvider {
        behavior: Mutex<MockPageBehavior>,
        counters: Arc<Counters>,
        visited: Arc<Mutex<Vec<String>>>,
        /// Panic inside `acquire` with this message
        crash: Option<String>,
    }

    impl MockContextProvider {
        pub fn new(behavior: MockPageBehavior) -> Self {
            Self {
                behavior: Mutex::new(behavior),
                counters: Arc::new(Counters::default()),
                visited: Arc::new(Mutex::new(Vec::new())),
                crash: None,
            }
        }

        /// Provider whose `acquire` panics
        pub fn crashing(message: impl Into<String>) -> Self {
            Self {
                crash: Some(message.into()),
                ..Self::serving("<html></html>")
            }
        }

        pub fn serving(html: impl Into<String>) -> Self {
            Self::new(MockPageBehavior::Serve(html.into()))
        }

        pub fn set_behavior(&self, behavior: MockPageBehavior) {
            *self.behavior.lock().unwrap() = behavior;
        }

        pub fn acquired(&self) -> usize {
            self.counters.acquired.load(Ordering::SeqCst)
        }

        pub fn released(&self) -> usize {
            self.counters.released.load(Ordering::SeqCst)
        }

        /// Highest number of simultaneously open contexts observed
        pub fn max_open(&self) -> usize {
            self.counters.max_open.load(Ordering::SeqCst)
        }

        /// Every address navigated to, across all contexts
        pub fn visited(&self) -> Vec<String> {
            self.visited.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ContextProvider for MockContextProvider {
        async fn acquire(
            &self,
            _options: &ContextOptions,
        ) -> Result<Box<dyn ExecutionContext>, NavigationError> {
            if let Some(message) = &self.crash {
                panic!("{}", message);
            }
            let n = self.counters.acquired.fetch_add(1, Ordering::SeqCst) + 1;
            let open = self.counters.open.fetch_add(1, Ordering::SeqCst) + 1;
            self.counters.max_open.fetch_max(open, Ordering::SeqCst);

            Ok(Box::new(MockPage {
                id: format!("ctx-{}", n),
                behavior: self.behavior.lock().unwrap().clone(),
                loaded: Mutex::new(None),
                counters: Arc::clone(&self.counters),
                visited: Arc::clone(&self.visited),
            }))
        }
    }

    struct MockPage {
        id: String,
        behavior: MockPageBehavior,
        loaded: Mutex<Option<String>>,
        counters: Arc<Counters>,
        visited: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl ExecutionContext for MockPage {
        fn id(&self) -> &str {
            &self.id
        }

        async fn goto(
            &self,
            url: &str,
            _wait: WaitUntil,
            timeout: Duration,
        ) -> Result<(), NavigationError> {
            self.visited.lock().unwrap().push(url.to_string());
            match &self.behavior {
                MockPageBehavior::Serve(_) => {
                    *self.loaded.lock().unwrap() = Some(url.to_string());
                    Ok(())
                }
                MockPageBehavior::HttpError(status) => Err(NavigationError::Http {
                    url: url.to_string(),
                    status: *status,
                }),
                MockPageBehavior::Hang => {
                    tokio::time::sleep(timeout).await;
                    Err(NavigationError::Timeout {
                        url: url.to_string(),
                        timeout_ms: timeout.as_millis() as u64,
                    })
                }
            }
        }

        fn current_url(&self) -> Option<String> {
            self.loaded.lock().unwrap().clone()
        }

        async fn content(&self) -> Result<String, NavigationError> {
            match (&self.behavior, self.current_url()) {
                (MockPageBehavior::Serve(html), Some(_)) => Ok(html.clone()),
                _ => Err(NavigationError::NotLoaded),
            }
        }

        async fn release(self: Box<Self>) {
            self.counters.released.fetch_add(1, Ordering::SeqCst);
            self.counters.open.fetch_sub(1, Ordering::SeqCst);
        }
    }
}
