// Context lease
//
// Owns an acquired execution context until it is released. The normal path
// calls `release()`; a lease dropped while still holding its context (run
// timed out, cancelled, or unwound) hands the teardown to the runtime.

use crate::port::ExecutionContext;
use tracing::{debug, warn};

pub struct ContextLease {
    context: Option<Box<dyn ExecutionContext>>,
}

impl ContextLease {
    pub fn new(context: Box<dyn ExecutionContext>) -> Self {
        Self {
            context: Some(context),
        }
    }

    /// The leased context. Always present until `release` consumes the lease.
    pub fn page(&self) -> &dyn ExecutionContext {
        match &self.context {
            Some(context) => context.as_ref(),
            None => unreachable!("context lease used after release"),
        }
    }

    pub async fn release(mut self) {
        if let Some(context) = self.context.take() {
            context.release().await;
        }
    }
}

impl Drop for ContextLease {
    fn drop(&mut self) {
        let Some(context) = self.context.take() else {
            return;
        };
        let id = context.id().to_string();
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                debug!(context_id = %id, "Releasing abandoned context");
                runtime.spawn(async move { context.release().await });
            }
            Err(_) => warn!(context_id = %id, "Context dropped outside a runtime, not released"),
        }
    }
}
