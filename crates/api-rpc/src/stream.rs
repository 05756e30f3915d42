//! Stream Bridge
//!
//! Opens one run through the orchestrator and forwards each event envelope as
//! one frame, in production order. The stream ends after the terminal frame
//! or when the consumer disconnects. A disconnect never fails the run: the run
//! keeps going server-side unless `cancel_on_disconnect` is enabled. A run
//! that dies without a terminal event still ends its stream with an error frame.

use async_trait::async_trait;
use extracta_core::application::{cancel_channel, CancelToken, RunOrchestrator, RunOutcome};
use extracta_core::domain::{ExtractionRequest, FetchMode, RunEnvelope, RunEvent};
use extracta_core::error::Result as AppResult;
use extracta_core::port::EventSink;
use jsonrpsee::{SubscriptionMessage, SubscriptionSink};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum FrameError {
    #[error("consumer disconnected")]
    Disconnected,

    #[error("frame encoding failed: {0}")]
    Encoding(String),
}

/// Where frames go: a live subscription, or anything else that can refuse them
#[async_trait]
pub trait FrameSink: Send + Sync {
    async fn send_frame(&self, envelope: &RunEnvelope) -> Result<(), FrameError>;
}

#[async_trait]
impl FrameSink for SubscriptionSink {
    async fn send_frame(&self, envelope: &RunEnvelope) -> Result<(), FrameError> {
        let message = SubscriptionMessage::from_json(envelope)
            .map_err(|e| FrameError::Encoding(e.to_string()))?;
        self.send(message).await.map_err(|_| FrameError::Disconnected)
    }
}

/// EventSink that hands envelopes to the forwarding loop.
/// Once the loop is gone, envelopes are dropped silently.
struct ChannelSink {
    tx: mpsc::UnboundedSender<RunEnvelope>,
}

#[async_trait]
impl EventSink for ChannelSink {
    async fn deliver(&self, envelope: RunEnvelope) {
        let _ = self.tx.send(envelope);
    }
}

/// What happened on the consumer side of one stream
pub struct StreamOutcome {
    pub frames_sent: usize,
    /// The terminal frame reached the consumer
    pub completed: bool,
    pub disconnected: bool,
    /// The run itself, which may outlive the stream
    pub run: JoinHandle<AppResult<RunOutcome>>,
}

pub struct StreamBridge {
    orchestrator: Arc<RunOrchestrator>,
    cancel_on_disconnect: bool,
}

impl StreamBridge {
    pub fn new(orchestrator: Arc<RunOrchestrator>, cancel_on_disconnect: bool) -> Self {
        Self {
            orchestrator,
            cancel_on_disconnect,
        }
    }

    /// Start a run and forward its events to `frames` until terminal or disconnect
    pub async fn stream<F: FrameSink + ?Sized>(
        &self,
        mode: FetchMode,
        request: ExtractionRequest,
        frames: &F,
    ) -> StreamOutcome {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (cancel, token) = if self.cancel_on_disconnect {
            let (handle, token) = cancel_channel();
            (Some(handle), token)
        } else {
            (None, CancelToken::never())
        };

        let run_id = self.orchestrator.allocate_run_id();
        let orchestrator = Arc::clone(&self.orchestrator);
        let sink: Arc<dyn EventSink> = Arc::new(ChannelSink { tx });
        let id = run_id.clone();
        let run = tokio::spawn(async move {
            orchestrator.run_as(id, mode, &request, sink, token).await
        });

        let mut frames_sent = 0;
        let mut completed = false;
        let mut disconnected = false;
        let mut last_timestamp = None;
        while let Some(envelope) = rx.recv().await {
            let terminal = envelope.is_terminal();
            last_timestamp = Some(envelope.timestamp);
            match frames.send_frame(&envelope).await {
                Ok(()) => frames_sent += 1,
                Err(e) => {
                    info!(run_id = %envelope.run_id, frames_sent, reason = %e, "Stream consumer gone, stop forwarding");
                    disconnected = true;
                    if let Some(cancel) = &cancel {
                        debug!(run_id = %envelope.run_id, "Cancelling abandoned run");
                        cancel.raise();
                    }
                    break;
                }
            }
            if terminal {
                completed = true;
                break;
            }
        }
        if !completed && !disconnected {
            warn!(run_id = %run_id, frames_sent, "Run ended without a terminal frame");
            let fault = RunEnvelope {
                run_id,
                timestamp: last_timestamp.unwrap_or_else(|| self.orchestrator.now_millis()),
                event: RunEvent::error("Run ended unexpectedly"),
            };
            match frames.send_frame(&fault).await {
                Ok(()) => {
                    frames_sent += 1;
                    completed = true;
                }
                Err(_) => disconnected = true,
            }
        }

        StreamOutcome {
            frames_sent,
            completed,
            disconnected,
            run,
        }
    }
}
