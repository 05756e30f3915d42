// Stop signals: worker shutdown and per-run cancellation

use tokio::sync::watch;

/// Receiving half of a one-shot stop signal
#[derive(Clone)]
pub struct SignalToken {
    rx: Option<watch::Receiver<bool>>,
}

impl SignalToken {
    /// A token that is never tripped
    pub fn never() -> Self {
        Self { rx: None }
    }

    /// Check if the signal was raised
    pub fn is_raised(&self) -> bool {
        self.rx.as_ref().map(|rx| *rx.borrow()).unwrap_or(false)
    }

    /// Wait for the signal.
    ///
    /// Pends forever for `never()` tokens and once the sender is dropped
    /// without having raised.
    pub async fn wait(&mut self) {
        if let Some(rx) = self.rx.as_mut() {
            loop {
                if *rx.borrow_and_update() {
                    return;
                }
                if rx.changed().await.is_err() {
                    break;
                }
            }
        }
        futures::future::pending::<()>().await
    }
}

/// Sending half of a one-shot stop signal
pub struct SignalSender {
    tx: watch::Sender<bool>,
}

impl SignalSender {
    pub fn raise(&self) {
        let _ = self.tx.send(true);
    }
}

fn signal_channel() -> (SignalSender, SignalToken) {
    let (tx, rx) = watch::channel(false);
    (SignalSender { tx }, SignalToken { rx: Some(rx) })
}

/// Shutdown signal for the worker supervisor
pub type ShutdownToken = SignalToken;
pub type ShutdownSender = SignalSender;

/// Cancellation signal for one in-flight run
pub type CancelToken = SignalToken;
pub type CancelHandle = SignalSender;

/// Create a shutdown channel
pub fn shutdown_channel() -> (ShutdownSender, ShutdownToken) {
    signal_channel()
}

/// Create a cancellation channel for one run
pub fn cancel_channel() -> (CancelHandle, CancelToken) {
    signal_channel()
}
