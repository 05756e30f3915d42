// HTTP execution contexts
//
// Each context is a fresh `reqwest::Client` with its own cookie jar, so runs
// never share session state. Pages are fetched as served (no script
// execution); every readiness signal is satisfied once the document body has
// been received.

use async_trait::async_trait;
use extracta_core::port::{
    ContextOptions, ContextProvider, ExecutionContext, NavigationError, WaitUntil,
};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_USER_AGENT: &str = concat!("extracta/", env!("CARGO_PKG_VERSION"));

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const MAX_REDIRECTS: usize = 5;

pub struct HttpContextProvider {
    user_agent: String,
    next_id: AtomicU64,
}

impl HttpContextProvider {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            next_id: AtomicU64::new(1),
        }
    }

    fn headers(options: &ContextOptions) -> Result<HeaderMap, NavigationError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        if let Some(locale) = &options.locale {
            let value = HeaderValue::from_str(&format!("{},*;q=0.5", locale))
                .map_err(|e| NavigationError::Launch(format!("invalid locale: {}", e)))?;
            headers.insert(ACCEPT_LANGUAGE, value);
        }
        Ok(headers)
    }
}

impl Default for HttpContextProvider {
    fn default() -> Self {
        Self::new(DEFAULT_USER_AGENT)
    }
}

#[async_trait]
impl ContextProvider for HttpContextProvider {
    async fn acquire(
        &self,
        options: &ContextOptions,
    ) -> Result<Box<dyn ExecutionContext>, NavigationError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .user_agent(self.user_agent.as_str())
            .default_headers(Self::headers(options)?)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| NavigationError::Launch(e.to_string()))?;

        let id = format!("http-{}", self.next_id.fetch_add(1, Ordering::Relaxed));
        debug!(context_id = %id, headless = options.headless, locale = ?options.locale, "Context acquired");
        Ok(Box::new(HttpPage {
            id,
            client,
            loaded: Mutex::new(None),
        }))
    }
}

struct LoadedPage {
    url: String,
    body: String,
}

pub struct HttpPage {
    id: String,
    client: reqwest::Client,
    loaded: Mutex<Option<LoadedPage>>,
}

impl HttpPage {
    async fn fetch(&self, url: &str) -> Result<LoadedPage, NavigationError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| NavigationError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NavigationError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().to_string();
        let body = response
            .text()
            .await
            .map_err(|e| NavigationError::Network(e.to_string()))?;
        Ok(LoadedPage {
            url: final_url,
            body,
        })
    }

    fn with_loaded<T>(&self, f: impl FnOnce(Option<&LoadedPage>) -> T) -> T {
        match self.loaded.lock() {
            Ok(guard) => f(guard.as_ref()),
            Err(poisoned) => f(poisoned.into_inner().as_ref()),
        }
    }
}

#[async_trait]
impl ExecutionContext for HttpPage {
    fn id(&self) -> &str {
        &self.id
    }

    async fn goto(
        &self,
        url: &str,
        wait: WaitUntil,
        timeout: Duration,
    ) -> Result<(), NavigationError> {
        debug!(context_id = %self.id, url = %url, wait = ?wait, "Navigating");
        let page = tokio::time::timeout(timeout, self.fetch(url))
            .await
            .map_err(|_| NavigationError::Timeout {
                url: url.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            })??;

        match self.loaded.lock() {
            Ok(mut guard) => *guard = Some(page),
            Err(poisoned) => *poisoned.into_inner() = Some(page),
        }
        Ok(())
    }

    fn current_url(&self) -> Option<String> {
        self.with_loaded(|page| page.map(|p| p.url.clone()))
    }

    async fn content(&self) -> Result<String, NavigationError> {
        self.with_loaded(|page| page.map(|p| p.body.clone()))
            .ok_or(NavigationError::NotLoaded)
    }

    async fn release(self: Box<Self>) {
        // Dropping the client discards its cookie jar and pooled connections
        debug!(context_id = %self.id, "Context released");
    }
}
