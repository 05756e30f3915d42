// Application constants (no magic values in orchestration code)
use std::time::Duration;

/// Default overall run timeout (60s)
pub const DEFAULT_RUN_TIMEOUT: Duration = Duration::from_secs(60);

/// Default bound on the "structure loaded" navigation signal (15s)
pub const DEFAULT_NAVIGATION_TIMEOUT: Duration = Duration::from_secs(15);

/// Default post-load settle delay for dynamic content (1.5s)
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(1500);

/// Settle delay never exceeds run_timeout / SETTLE_CAP_DIVISOR
pub const SETTLE_CAP_DIVISOR: u32 = 10;

/// Default parallelism for list-mode enrichment lookups
pub const DEFAULT_ENRICH_CONCURRENCY: usize = 2;

/// Grace period the daemon gives the worker to finish on shutdown (5s)
pub const WORKER_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Fixed progress checkpoints emitted by every run.
///
/// These are phase markers, not measured completion fractions.
pub mod checkpoint {
    pub const STARTED: (u8, &str) = (0, "Run started");
    pub const NAVIGATING: (u8, &str) = (10, "Navigating to target");
    pub const LOADED: (u8, &str) = (30, "Page structure loaded");
    pub const EXTRACTING: (u8, &str) = (50, "Extracting content");
    pub const FINISHED: (u8, &str) = (100, "Extraction complete");
}
