// Extracted payload & job result

use crate::domain::job::JobId;
use serde::{Deserialize, Serialize};

/// Opaque extracted data: one item or a collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtractedPayload {
    Many(Vec<serde_json::Value>),
    Single(serde_json::Value),
}

impl ExtractedPayload {
    pub fn item_count(&self) -> usize {
        match self {
            ExtractedPayload::Single(v) if v.is_null() => 0,
            ExtractedPayload::Single(_) => 1,
            ExtractedPayload::Many(items) => items.len(),
        }
    }

    /// A null single item or an empty collection counts as "no usable data"
    pub fn is_empty(&self) -> bool {
        self.item_count() == 0
    }

    /// Items in order, for per-item data events
    pub fn items(&self) -> Vec<&serde_json::Value> {
        match self {
            ExtractedPayload::Single(v) if v.is_null() => Vec::new(),
            ExtractedPayload::Single(v) => vec![v],
            ExtractedPayload::Many(items) => items.iter().collect(),
        }
    }

    pub fn into_value(self) -> serde_json::Value {
        match self {
            ExtractedPayload::Single(v) => v,
            ExtractedPayload::Many(items) => serde_json::Value::Array(items),
        }
    }
}

/// Stored result of a successful job. Written once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResult {
    pub job_id: JobId,
    pub payload: ExtractedPayload,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_item_count() {
        assert_eq!(ExtractedPayload::Single(json!({"a": 1})).item_count(), 1);
        assert_eq!(ExtractedPayload::Many(vec![json!(1), json!(2)]).item_count(), 2);
        assert!(ExtractedPayload::Single(serde_json::Value::Null).is_empty());
        assert!(ExtractedPayload::Many(vec![]).is_empty());
    }

    #[test]
    fn test_untagged_wire_shape() {
        let many = serde_json::to_value(ExtractedPayload::Many(vec![json!("x")])).unwrap();
        assert_eq!(many, json!(["x"]));
        let single: ExtractedPayload = serde_json::from_value(json!({"k": "v"})).unwrap();
        assert_eq!(single, ExtractedPayload::Single(json!({"k": "v"})));
    }
}
