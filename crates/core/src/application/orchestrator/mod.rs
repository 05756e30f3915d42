//! Run Orchestrator
//!
//! Executes one extraction attempt ("run") with its own isolated execution
//! context and turns its lifecycle into correlated events:
//!
//! ```text
//! resolve extractor ──(unsupported)──────────────────────────────► error
//!        │
//! acquire context → progress 0 → navigate (10, 30) → extract (50)
//!        │                                              │
//!        │                          ok ─► data* → progress 100 → complete
//!        │                          err/empty/timeout/cancel ─► error
//!        └──────────── context released on every path ◄─────────┘
//! ```
//!
//! The run object is dropped once its terminal event has been delivered.

mod enrichment;
mod lease;
mod navigation;

use lease::ContextLease;

pub use enrichment::EnrichmentPool;
pub use navigation::NavigationPolicy;

use crate::application::constants::{
    checkpoint, DEFAULT_ENRICH_CONCURRENCY, DEFAULT_NAVIGATION_TIMEOUT, DEFAULT_RUN_TIMEOUT,
    DEFAULT_SETTLE_DELAY,
};
use crate::application::panic_guard::guard_async;
use crate::application::signal::CancelToken;
use crate::application::ExtractorRegistry;
use crate::domain::{
    ExtractedPayload, ExtractionRequest, FetchMode, RunEvent, RunId, RunPhase,
};
use crate::error::{AppError, Result};
use crate::port::{
    ContextOptions, ContextProvider, DetailFetcher, EventSink, ExecutionContext, ExtractionScope,
    Extractor, ExtractorError, IdProvider, RunEmitter, TimeProvider,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, info_span, warn, Instrument};

/// Orchestrator tuning
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Used when the request carries no `timeoutMs`
    pub run_timeout: Duration,
    pub navigation_timeout: Duration,
    pub settle_delay: Duration,
    pub enrich_concurrency: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            run_timeout: DEFAULT_RUN_TIMEOUT,
            navigation_timeout: DEFAULT_NAVIGATION_TIMEOUT,
            settle_delay: DEFAULT_SETTLE_DELAY,
            enrich_concurrency: DEFAULT_ENRICH_CONCURRENCY,
        }
    }
}

/// Successful run result
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub run_id: RunId,
    pub payload: ExtractedPayload,
    pub duration_ms: u64,
}

pub struct RunOrchestrator {
    extractors: Arc<ExtractorRegistry>,
    contexts: Arc<dyn ContextProvider>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
    config: OrchestratorConfig,
}

impl RunOrchestrator {
    pub fn new(
        extractors: Arc<ExtractorRegistry>,
        contexts: Arc<dyn ContextProvider>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            extractors,
            contexts,
            id_provider,
            time_provider,
            config,
        }
    }

    pub fn extractors(&self) -> &ExtractorRegistry {
        &self.extractors
    }

    /// Single-item fetch
    pub async fn fetch_one(
        &self,
        request: &ExtractionRequest,
        sink: Arc<dyn EventSink>,
    ) -> Result<ExtractedPayload> {
        self.run(FetchMode::One, request, sink, CancelToken::never())
            .await
            .map(|outcome| outcome.payload)
    }

    /// List fetch (with per-item enrichment through the detail table)
    pub async fn fetch_list(
        &self,
        request: &ExtractionRequest,
        sink: Arc<dyn EventSink>,
    ) -> Result<ExtractedPayload> {
        self.run(FetchMode::List, request, sink, CancelToken::never())
            .await
            .map(|outcome| outcome.payload)
    }

    /// Single-item fetch through the alternate detail handler table
    pub async fn fetch_detail(
        &self,
        request: &ExtractionRequest,
        sink: Arc<dyn EventSink>,
    ) -> Result<ExtractedPayload> {
        self.run(FetchMode::Detail, request, sink, CancelToken::never())
            .await
            .map(|outcome| outcome.payload)
    }

    /// Execute one run end to end.
    ///
    /// Exactly one terminal event (complete or error) is delivered to `sink`
    /// before this returns.
    pub async fn run(
        &self,
        mode: FetchMode,
        request: &ExtractionRequest,
        sink: Arc<dyn EventSink>,
        cancel: CancelToken,
    ) -> Result<RunOutcome> {
        self.run_as(self.allocate_run_id(), mode, request, sink, cancel)
            .await
    }

    /// Fresh correlation id, for callers that need it before the run starts
    pub fn allocate_run_id(&self) -> RunId {
        RunId::new(self.id_provider.generate_id())
    }

    pub fn now_millis(&self) -> i64 {
        self.time_provider.now_millis()
    }

    /// `run` under a correlation id from `allocate_run_id`
    pub async fn run_as(
        &self,
        run_id: RunId,
        mode: FetchMode,
        request: &ExtractionRequest,
        sink: Arc<dyn EventSink>,
        cancel: CancelToken,
    ) -> Result<RunOutcome> {
        let span = info_span!(
            "run",
            run_id = %run_id,
            mode = %mode,
            category = %request.category,
            source = %request.source
        );
        let emitter = RunEmitter::new(run_id, sink, Arc::clone(&self.time_provider));

        match guard_async(self.run_with(mode, request, &emitter, cancel))
            .instrument(span)
            .await
        {
            Ok(result) => result,
            // Faults outside extraction (context setup, bookkeeping) still end the run
            Err(panic_msg) => {
                let error = AppError::Internal(format!("run panicked: {}", panic_msg));
                if !emitter.terminated() {
                    emitter.emit(RunEvent::error(error.to_string())).await;
                }
                Err(error)
            }
        }
    }

    async fn run_with(
        &self,
        mode: FetchMode,
        request: &ExtractionRequest,
        emitter: &RunEmitter,
        mut cancel: CancelToken,
    ) -> Result<RunOutcome> {
        // 1. Resolve before allocating anything
        let extractor = match self
            .extractors
            .resolve(mode, &request.category, &request.source)
        {
            Ok(extractor) => extractor,
            Err(e) => return Err(Self::fail(emitter, RunPhase::Start, e).await),
        };

        // 2. Isolated context for this run only
        let started = Instant::now();
        let mut phase = RunPhase::Start;
        let context = match self
            .contexts
            .acquire(&ContextOptions::from_request(request))
            .await
        {
            Ok(context) => ContextLease::new(context),
            Err(e) => return Err(Self::fail(emitter, phase, e.into()).await),
        };
        info!(context_id = %context.page().id(), url = %request.url, "Run started");

        // 3. Initial progress
        let (percent, message) = checkpoint::STARTED;
        emitter.progress(message, percent).await;

        // 4-5. Navigate + extract, bounded by the run timeout and the cancel token
        let run_timeout = self.run_timeout_for(request);
        let outcome = tokio::select! {
            bounded = tokio::time::timeout(
                run_timeout,
                guard_async(self.drive(mode, context.page(), request, extractor, emitter, &mut phase, run_timeout)),
            ) => match bounded {
                Ok(Ok(result)) => result,
                Ok(Err(panic_msg)) => Err(AppError::Extraction(ExtractorError::Failed(
                    format!("extractor panicked: {}", panic_msg),
                ))),
                Err(_) => Err(AppError::Timeout(run_timeout.as_millis() as u64)),
            },
            _ = cancel.wait() => Err(AppError::Cancelled),
        };

        // 8. Release on every exit path (a dropped lease releases itself)
        context.release().await;

        match outcome {
            Ok(payload) => {
                let duration_ms = started.elapsed().as_millis() as u64;
                self.succeed(emitter, &mut phase, &payload, duration_ms).await;
                Ok(RunOutcome {
                    run_id: emitter.run_id().clone(),
                    payload,
                    duration_ms,
                })
            }
            Err(e) => Err(Self::fail(emitter, phase, e).await),
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn drive(
        &self,
        mode: FetchMode,
        page: &dyn ExecutionContext,
        request: &ExtractionRequest,
        extractor: Arc<dyn Extractor>,
        emitter: &RunEmitter,
        phase: &mut RunPhase,
        run_timeout: Duration,
    ) -> Result<ExtractedPayload> {
        phase.advance(RunPhase::Navigating)?;
        let (percent, message) = checkpoint::NAVIGATING;
        emitter.progress(message, percent).await;

        self.navigation()
            .navigate(page, &request.url, run_timeout)
            .await?;
        let (percent, message) = checkpoint::LOADED;
        emitter.progress(message, percent).await;

        phase.advance(RunPhase::Extracting)?;
        let (percent, message) = checkpoint::EXTRACTING;
        emitter.progress(message, percent).await;

        let enrichment = (mode == FetchMode::List).then(|| {
            EnrichmentPool::new(
                Arc::clone(&self.contexts),
                self.extractors.detail_for(request),
                request.clone(),
                emitter.run_id().clone(),
                Arc::clone(&self.time_provider),
                self.navigation(),
                run_timeout,
                self.config.enrich_concurrency,
            )
        });
        let scope = ExtractionScope {
            page,
            request,
            emit: emitter,
            enrichment: enrichment.as_ref().map(|pool| pool as &dyn DetailFetcher),
        };

        let payload = extractor.extract(&scope).await?;
        if payload.is_empty() {
            return Err(ExtractorError::Empty.into());
        }
        Ok(payload)
    }

    /// Emit data (unless the extractor already streamed it), progress 100 and complete
    async fn succeed(
        &self,
        emitter: &RunEmitter,
        phase: &mut RunPhase,
        payload: &ExtractedPayload,
        duration_ms: u64,
    ) {
        if let Err(e) = phase.advance(RunPhase::Completed) {
            warn!(error = %e, "Unexpected run phase on success");
        }

        if emitter.data_emitted() == 0 {
            match payload {
                ExtractedPayload::Single(item) => emitter.data(item.clone()).await,
                ExtractedPayload::Many(items) => {
                    let total = items.len();
                    for (index, item) in items.iter().enumerate() {
                        emitter.data_at(item.clone(), index, total).await;
                    }
                }
            }
        }

        let (percent, message) = checkpoint::FINISHED;
        emitter.progress(message, percent).await;
        let item_count = payload.item_count();
        emitter
            .emit(RunEvent::complete(item_count, duration_ms))
            .await;
        info!(item_count, duration_ms, "Run completed");
    }

    /// Emit the single error event and hand the error back to the caller
    async fn fail(emitter: &RunEmitter, mut phase: RunPhase, error: AppError) -> AppError {
        if let Err(e) = phase.advance(RunPhase::Failed) {
            warn!(error = %e, "Unexpected run phase on failure");
        }
        warn!(error = %error, "Run failed");
        emitter.emit(RunEvent::error(error.to_string())).await;
        error
    }

    fn navigation(&self) -> NavigationPolicy {
        NavigationPolicy {
            navigation_timeout: self.config.navigation_timeout,
            settle_delay: self.config.settle_delay,
        }
    }

    fn run_timeout_for(&self, request: &ExtractionRequest) -> Duration {
        request
            .options
            .timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(self.config.run_timeout)
    }
}
