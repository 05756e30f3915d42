// List-mode enrichment pool
//
// Per-item detail lookups run through the detail handler table, each on its
// own freshly acquired context, at most `concurrency` at a time. Contexts are
// leased, so abandoning the parent run still releases every one of them.

use crate::application::panic_guard::guard_async;
use crate::domain::{ExtractionRequest, RunId};
use crate::port::{
    ContextOptions, ContextProvider, DetailFetcher, ExecutionContext, ExtractionScope, Extractor,
    NullSink, RunEmitter, TimeProvider,
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use super::lease::ContextLease;
use super::navigation::NavigationPolicy;

pub struct EnrichmentPool {
    contexts: Arc<dyn ContextProvider>,
    detail: Option<Arc<dyn Extractor>>,
    request: ExtractionRequest,
    run_id: RunId,
    time_provider: Arc<dyn TimeProvider>,
    navigation: NavigationPolicy,
    run_timeout: Duration,
    permits: Arc<Semaphore>,
}

impl EnrichmentPool {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        contexts: Arc<dyn ContextProvider>,
        detail: Option<Arc<dyn Extractor>>,
        request: ExtractionRequest,
        run_id: RunId,
        time_provider: Arc<dyn TimeProvider>,
        navigation: NavigationPolicy,
        run_timeout: Duration,
        concurrency: usize,
    ) -> Self {
        Self {
            contexts,
            detail,
            request,
            run_id,
            time_provider,
            navigation,
            run_timeout,
            permits: Arc::new(Semaphore::new(concurrency.max(1))),
        }
    }

    async fn fetch_one(&self, extractor: &dyn Extractor, url: String) -> Option<serde_json::Value> {
        let _permit = self.permits.acquire().await.ok()?;

        let lease = match self
            .contexts
            .acquire(&ContextOptions::from_request(&self.request))
            .await
        {
            Ok(ctx) => ContextLease::new(ctx),
            Err(e) => {
                warn!(run_id = %self.run_id, url = %url, error = %e, "Enrichment context unavailable");
                return None;
            }
        };

        let detail = match guard_async(self.detail_in(lease.page(), extractor, &url)).await {
            Ok(detail) => detail,
            Err(panic_msg) => Err(format!("extractor panicked: {}", panic_msg)),
        };
        lease.release().await;

        match detail {
            Ok(value) => value,
            Err(e) => {
                warn!(run_id = %self.run_id, url = %url, error = %e, "Enrichment lookup failed");
                None
            }
        }
    }

    async fn detail_in(
        &self,
        page: &dyn ExecutionContext,
        extractor: &dyn Extractor,
        url: &str,
    ) -> Result<Option<serde_json::Value>, String> {
        self.navigation
            .navigate(page, url, self.run_timeout)
            .await
            .map_err(|e| e.to_string())?;

        let mut request = self.request.clone();
        request.url = url.to_string();

        // Sub-lookups stay silent: only the parent run reports to the client
        let emitter = RunEmitter::new(
            self.run_id.clone(),
            Arc::new(NullSink),
            Arc::clone(&self.time_provider),
        );
        let scope = ExtractionScope {
            page,
            request: &request,
            emit: &emitter,
            enrichment: None,
        };

        let payload = extractor.extract(&scope).await.map_err(|e| e.to_string())?;
        debug!(run_id = %self.run_id, url = %url, items = payload.item_count(), "Enriched item");
        Ok((!payload.is_empty()).then(|| payload.into_value()))
    }
}

#[async_trait]
impl DetailFetcher for EnrichmentPool {
    async fn fetch_details(&self, urls: Vec<String>) -> Vec<Option<serde_json::Value>> {
        let Some(extractor) = self.detail.clone() else {
            warn!(
                run_id = %self.run_id,
                category = %self.request.category,
                source = %self.request.source,
                "No detail handler registered, skipping enrichment"
            );
            return vec![None; urls.len()];
        };

        let lookups = urls
            .into_iter()
            .map(|url| self.fetch_one(extractor.as_ref(), url));
        futures::future::join_all(lookups).await
    }
}
