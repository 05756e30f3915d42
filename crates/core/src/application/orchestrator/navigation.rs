// Bounded navigation strategy
//
// Wait for the fast "structure loaded" signal, then give dynamic content a
// short settle delay capped at a fraction of the run timeout. Never waits for
// network quiescence.

use crate::application::constants::SETTLE_CAP_DIVISOR;
use crate::port::{ExecutionContext, NavigationError, WaitUntil};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
pub struct NavigationPolicy {
    pub navigation_timeout: Duration,
    pub settle_delay: Duration,
}

impl NavigationPolicy {
    /// Navigation signal bound: never longer than the run itself
    pub fn navigation_timeout_for(&self, run_timeout: Duration) -> Duration {
        self.navigation_timeout.min(run_timeout)
    }

    /// Settle delay, capped well below the run timeout
    pub fn settle_for(&self, run_timeout: Duration) -> Duration {
        self.settle_delay.min(run_timeout / SETTLE_CAP_DIVISOR)
    }

    pub async fn navigate(
        &self,
        page: &dyn ExecutionContext,
        url: &str,
        run_timeout: Duration,
    ) -> Result<(), NavigationError> {
        let nav_timeout = self.navigation_timeout_for(run_timeout);
        page.goto(url, WaitUntil::DomContentLoaded, nav_timeout)
            .await?;

        let settle = self.settle_for(run_timeout);
        debug!(
            context_id = %page.id(),
            settle_ms = settle.as_millis() as u64,
            "Structure loaded, settling"
        );
        if !settle.is_zero() {
            tokio::time::sleep(settle).await;
        }
        Ok(())
    }
}
