// Event Sink Port
//
// A sink receives the stamped envelopes of exactly one run, in production order.
// Delivery is infallible from the run's point of view: a sink whose consumer
// went away swallows the frame itself.

use crate::domain::{RunEnvelope, RunEvent, RunId};
use crate::port::TimeProvider;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

#[async_trait]
pub trait EventSink: Send + Sync {
    /// Deliver one envelope. Called sequentially; never concurrently for one run.
    async fn deliver(&self, envelope: RunEnvelope);
}

/// Sink that drops every envelope
pub struct NullSink;

#[async_trait]
impl EventSink for NullSink {
    async fn deliver(&self, _envelope: RunEnvelope) {}
}

/// Per-run stamping emitter handed to extractors.
///
/// Stamps every event with the run's correlation id and a timestamp before it
/// reaches the sink. Extractors may only raise progress and data events;
/// terminal events are reserved for the orchestrator.
pub struct RunEmitter {
    run_id: RunId,
    sink: Arc<dyn EventSink>,
    time_provider: Arc<dyn TimeProvider>,
    data_emitted: AtomicUsize,
    terminated: AtomicBool,
}

impl RunEmitter {
    pub fn new(
        run_id: RunId,
        sink: Arc<dyn EventSink>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            run_id,
            sink,
            time_provider,
            data_emitted: AtomicUsize::new(0),
            terminated: AtomicBool::new(false),
        }
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    pub async fn progress(&self, message: impl Into<String>, percent: u8) {
        self.emit(RunEvent::progress(message, percent)).await;
    }

    pub async fn data(&self, payload: serde_json::Value) {
        self.emit(RunEvent::data(payload)).await;
    }

    pub async fn data_at(&self, payload: serde_json::Value, index: usize, total: usize) {
        self.emit(RunEvent::data_at(payload, index, total)).await;
    }

    /// Number of data events raised so far in this run
    pub fn data_emitted(&self) -> usize {
        self.data_emitted.load(Ordering::SeqCst)
    }

    /// A complete or error event has been delivered
    pub fn terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }

    pub(crate) async fn emit(&self, event: RunEvent) {
        if matches!(event, RunEvent::Data { .. }) {
            self.data_emitted.fetch_add(1, Ordering::SeqCst);
        }
        let terminal = event.is_terminal();
        let envelope = RunEnvelope {
            run_id: self.run_id.clone(),
            timestamp: self.time_provider.now_millis(),
            event,
        };
        self.sink.deliver(envelope).await;
        if terminal {
            self.terminated.store(true, Ordering::SeqCst);
        }
    }
}

pub mod mocks {
    use super::*;
    use std::sync::Mutex;
    use tokio::sync::Notify;

    /// Collects every envelope and signals when a terminal one arrives
    #[derive(Default)]
    pub struct RecordingSink {
        envelopes: Mutex<Vec<RunEnvelope>>,
        terminal: Notify,
    }

    impl RecordingSink {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn envelopes(&self) -> Vec<RunEnvelope> {
            self.envelopes.lock().unwrap().clone()
        }

        pub fn events(&self) -> Vec<RunEvent> {
            self.envelopes().into_iter().map(|e| e.event).collect()
        }

        /// Event kinds in delivery order ("progress", "data", ...)
        pub fn kinds(&self) -> Vec<&'static str> {
            self.envelopes
                .lock()
                .unwrap()
                .iter()
                .map(|e| e.event.kind())
                .collect()
        }

        /// Progress percents in delivery order
        pub fn percents(&self) -> Vec<u8> {
            self.events()
                .into_iter()
                .filter_map(|e| match e {
                    RunEvent::Progress { percent, .. } => Some(percent),
                    _ => None,
                })
                .collect()
        }

        /// Resolves once a terminal envelope has been delivered
        pub async fn wait_terminal(&self) {
            loop {
                let notified = self.terminal.notified();
                if self.envelopes().iter().any(|e| e.is_terminal()) {
                    return;
                }
                notified.await;
            }
        }
    }

    #[async_trait]
    impl EventSink for RecordingSink {
        async fn deliver(&self, envelope: RunEnvelope) {
            let terminal = envelope.is_terminal();
            self.envelopes.lock().unwrap().push(envelope);
            if terminal {
                self.terminal.notify_waiters();
            }
        }
    }
}
