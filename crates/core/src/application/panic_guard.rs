// Panic isolation: one job's panic must not take down the worker loop
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tracing::error;

/// Render a panic payload as text
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Poll `future` to completion, converting a panic into `Err(message)`
pub async fn guard_async<F, T>(future: F) -> Result<T, String>
where
    F: Future<Output = T>,
{
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(value) => Ok(value),
        Err(payload) => {
            let msg = panic_message(payload.as_ref());
            error!(panic_msg = %msg, "Guarded task panicked");
            Err(msg)
        }
    }
}

/// Run `future` on its own task so that even a panic inside a `Drop`
/// cannot unwind into the caller
pub async fn isolate<F, T>(future: F) -> Result<T, String>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn(future).await {
        Ok(value) => Ok(value),
        Err(join_err) if join_err.is_panic() => {
            let msg = panic_message(join_err.into_panic().as_ref());
            error!(panic_msg = %msg, "Isolated task panicked");
            Err(msg)
        }
        Err(join_err) => Err(format!("task cancelled: {}", join_err)),
    }
}
