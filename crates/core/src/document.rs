//! Core record types for vecstore.
//!
//! A `VectorRecord` is a stored vector under a string id with optional
//! JSON-object metadata. Metadata values are `serde_json::Value`, whose
//! variants (null, bool, number, string, array, object) are the tagged union
//! the filter evaluator and the BM25 text extractor operate on.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Metadata attached to a record: a JSON object of arbitrary, possibly nested values.
pub type Metadata = Map<String, Value>;

/// A stored vector with its id, metadata and (for cosine stores) cached norm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    /// Unique identifier within the store.
    pub id: String,
    /// Owned copy of the vector; length equals the store's dimensions.
    pub vector: Vec<f32>,
    /// Optional metadata.
    pub metadata: Option<Metadata>,
    /// Euclidean norm, present only when the store metric is cosine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub norm: Option<f32>,
}

impl VectorRecord {
    /// Creates a record without a cached norm.
    pub fn new(id: impl Into<String>, vector: Vec<f32>, metadata: Option<Metadata>) -> Self {
        Self {
            id: id.into(),
            vector,
            metadata,
            norm: None,
        }
    }

    /// Rough heap footprint in bytes, used for store stats.
    pub fn estimate_bytes(&self) -> usize {
        let mut total = self.id.len() + 24;
        total += self.vector.len() * 4 + 24;
        total += 8;
        if let Some(ref meta) = self.metadata {
            total += meta
                .iter()
                .map(|(k, v)| k.len() + estimate_value_bytes(v))
                .sum::<usize>();
        }
        total
    }
}

/// Build a metadata map from a JSON value. Non-object values yield `None`.
pub fn metadata_from_value(value: Value) -> Option<Metadata> {
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

fn estimate_value_bytes(value: &Value) -> usize {
    match value {
        Value::Null | Value::Bool(_) => 8,
        Value::Number(_) => 16,
        Value::String(s) => s.len() + 24,
        Value::Array(items) => 24 + items.iter().map(estimate_value_bytes).sum::<usize>(),
        Value::Object(map) => {
            48 + map
                .iter()
                .map(|(k, v)| k.len() + estimate_value_bytes(v))
                .sum::<usize>()
        }
    }
}
