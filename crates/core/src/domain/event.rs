//! Run event protocol
//!
//! A run reports its lifecycle as a closed set of four events. Every event
//! leaves the orchestrator wrapped in a [`RunEnvelope`] carrying the run's
//! correlation id and a timestamp; extractors never build envelopes themselves.
//!
//! Wire shape (one JSON object per frame):
//! ```text
//! {"type":"progress","message":"Navigating","percent":10,"runId":"...","timestamp":1700000000000}
//! ```

use serde::{Deserialize, Serialize};

/// Run correlation identifier, stable for the lifetime of one run
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle event raised during a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum RunEvent {
    Progress {
        message: String,
        percent: u8,
    },
    Data {
        payload: serde_json::Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        total: Option<usize>,
    },
    Error {
        message: String,
    },
    Complete {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        item_count: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        duration_ms: Option<u64>,
    },
}

impl RunEvent {
    pub fn progress(message: impl Into<String>, percent: u8) -> Self {
        RunEvent::Progress {
            message: message.into(),
            percent: percent.min(100),
        }
    }

    pub fn data(payload: serde_json::Value) -> Self {
        RunEvent::Data {
            payload,
            index: None,
            total: None,
        }
    }

    pub fn data_at(payload: serde_json::Value, index: usize, total: usize) -> Self {
        RunEvent::Data {
            payload,
            index: Some(index),
            total: Some(total),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        RunEvent::Error {
            message: message.into(),
        }
    }

    pub fn complete(item_count: usize, duration_ms: u64) -> Self {
        RunEvent::Complete {
            item_count: Some(item_count),
            duration_ms: Some(duration_ms),
        }
    }

    /// Complete and Error end a run's event sequence
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunEvent::Error { .. } | RunEvent::Complete { .. })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RunEvent::Progress { .. } => "progress",
            RunEvent::Data { .. } => "data",
            RunEvent::Error { .. } => "error",
            RunEvent::Complete { .. } => "complete",
        }
    }
}

/// Event stamped with correlation id and timestamp at the orchestrator boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunEnvelope {
    pub run_id: RunId,
    /// epoch ms
    pub timestamp: i64,
    #[serde(flatten)]
    pub event: RunEvent,
}

impl RunEnvelope {
    pub fn is_terminal(&self) -> bool {
        self.event.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_progress_frame_shape() {
        let envelope = RunEnvelope {
            run_id: RunId::new("run-1"),
            timestamp: 42,
            event: RunEvent::progress("Navigating", 10),
        };
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            value,
            json!({"type": "progress", "message": "Navigating", "percent": 10, "runId": "run-1", "timestamp": 42})
        );
    }

    #[test]
    fn test_complete_frame_uses_camel_case_fields() {
        let envelope = RunEnvelope {
            run_id: RunId::new("run-1"),
            timestamp: 42,
            event: RunEvent::complete(3, 1500),
        };
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["type"], "complete");
        assert_eq!(value["itemCount"], 3);
        assert_eq!(value["durationMs"], 1500);
    }

    #[test]
    fn test_data_frame_omits_missing_index() {
        let value = serde_json::to_value(RunEnvelope {
            run_id: RunId::new("r"),
            timestamp: 1,
            event: RunEvent::data(json!({"name": "x"})),
        })
        .unwrap();
        assert!(value.get("index").is_none());
        assert_eq!(value["payload"]["name"], "x");
    }

    #[test]
    fn test_envelope_parses_back() {
        let frame = json!({"type": "error", "message": "boom", "runId": "r-9", "timestamp": 7});
        let envelope: RunEnvelope = serde_json::from_value(frame).unwrap();
        assert_eq!(envelope.run_id.as_str(), "r-9");
        assert_eq!(envelope.event, RunEvent::error("boom"));
        assert!(envelope.is_terminal());
    }

    #[test]
    fn test_percent_is_clamped() {
        assert_eq!(
            RunEvent::progress("x", 250),
            RunEvent::Progress {
                message: "x".into(),
                percent: 100
            }
        );
    }
}
