//! Versioned, JSON-representable snapshots of a store and its BM25 index.
//!
//! ```json
//! {
//!   "version": "1.0", "dimensions": 3, "distance": "cosine", "indexKind": "flat",
//!   "vectors": [ { "id": "a", "vector": [1, 0, 0], "metadata": null, "norm": 1 } ],
//!   "bm25Index": { "version": "1.0", "k1": 1.2, "b": 0.75, "textFields": ["title"], ... }
//! }
//! ```
//!
//! `bm25Index` is optional; snapshots without it load with keyword search disabled.

use crate::config::{IndexKind, TokenizerConfig};
use crate::distance::DistanceMetric;
use crate::document::Metadata;
use crate::error::{Result, VectorStoreError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Full store snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
    pub version: String,
    pub dimensions: usize,
    pub distance: DistanceMetric,
    #[serde(default)]
    pub index_kind: IndexKind,
    pub vectors: Vec<VectorSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bm25_index: Option<Bm25Snapshot>,
}

/// One stored vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorSnapshot {
    pub id: String,
    pub vector: Vec<f32>,
    #[serde(default)]
    pub metadata: Option<Metadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub norm: Option<f32>,
}

/// BM25 scoring state, sufficient to score without the original text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bm25Snapshot {
    pub version: String,
    pub k1: f32,
    pub b: f32,
    pub text_fields: Vec<String>,
    pub avg_doc_length: f32,
    pub document_count: usize,
    pub documents: Vec<Bm25DocumentSnapshot>,
    pub document_frequencies: BTreeMap<String, u32>,
    /// Tokenizer options; absent in older snapshots, meaning defaults.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokenizer: Option<TokenizerConfig>,
}

/// Term statistics for one BM25 document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bm25DocumentSnapshot {
    pub id: String,
    pub length: u32,
    pub term_frequencies: BTreeMap<String, u32>,
}

impl StoreSnapshot {
    /// Structural checks that do not depend on building the store.
    pub fn validate(&self) -> Result<()> {
        if self.version.trim().is_empty() {
            return Err(VectorStoreError::InvalidSnapshot(
                "missing version".to_string(),
            ));
        }
        if self.dimensions == 0 {
            return Err(VectorStoreError::InvalidSnapshot(
                "dimensions must be positive".to_string(),
            ));
        }
        for v in &self.vectors {
            if v.vector.len() != self.dimensions {
                return Err(VectorStoreError::InvalidSnapshot(format!(
                    "vector '{}' has length {}, expected {}",
                    v.id,
                    v.vector.len(),
                    self.dimensions
                )));
            }
            if v.vector.iter().any(|x| !x.is_finite()) {
                return Err(VectorStoreError::InvalidSnapshot(format!(
                    "vector '{}' has a non-finite component",
                    v.id
                )));
            }
        }
        Ok(())
    }

    /// Parse a snapshot from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to compact JSON text.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_minimal_without_bm25() {
        let snap: StoreSnapshot = serde_json::from_value(json!({
            "version": "1.0",
            "dimensions": 2,
            "distance": "euclidean",
            "indexKind": "flat",
            "vectors": [ { "id": "a", "vector": [1.0, 2.0], "metadata": null } ]
        }))
        .unwrap();
        assert_eq!(snap.distance, DistanceMetric::Euclidean);
        assert!(snap.bm25_index.is_none());
        assert!(snap.vectors[0].norm.is_none());
        snap.validate().unwrap();
    }

    #[test]
    fn test_wire_field_names() {
        let snap = StoreSnapshot {
            version: "1.0".into(),
            dimensions: 1,
            distance: DistanceMetric::DotProduct,
            index_kind: IndexKind::Hnsw,
            vectors: vec![],
            bm25_index: Some(Bm25Snapshot {
                version: "1.0".into(),
                k1: 1.2,
                b: 0.75,
                text_fields: vec!["title".into()],
                avg_doc_length: 0.0,
                document_count: 0,
                documents: vec![],
                document_frequencies: BTreeMap::new(),
                tokenizer: None,
            }),
        };
        let v = serde_json::to_value(&snap).unwrap();
        assert_eq!(v["distance"], json!("dot"));
        assert_eq!(v["indexKind"], json!("hnsw"));
        assert_eq!(v["bm25Index"]["textFields"], json!(["title"]));
        assert!(v["bm25Index"].get("avgDocLength").is_some());
        assert!(v["bm25Index"].get("documentFrequencies").is_some());
    }

    #[test]
    fn test_validate_rejects_wrong_length() {
        let snap = StoreSnapshot {
            version: "1.0".into(),
            dimensions: 3,
            distance: DistanceMetric::Cosine,
            index_kind: IndexKind::Flat,
            vectors: vec![VectorSnapshot {
                id: "a".into(),
                vector: vec![1.0],
                metadata: None,
                norm: None,
            }],
            bm25_index: None,
        };
        assert!(matches!(snap.validate(), Err(VectorStoreError::InvalidSnapshot(_))));
    }

    #[test]
    fn test_validate_rejects_empty_version() {
        let snap = StoreSnapshot {
            version: String::new(),
            dimensions: 3,
            distance: DistanceMetric::Cosine,
            index_kind: IndexKind::Flat,
            vectors: vec![],
            bm25_index: None,
        };
        assert!(snap.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_non_finite_component() {
        let snap = StoreSnapshot {
            version: "1.0".into(),
            dimensions: 2,
            distance: DistanceMetric::Euclidean,
            index_kind: IndexKind::Flat,
            vectors: vec![VectorSnapshot {
                id: "a".into(),
                vector: vec![f32::NAN, 1.0],
                metadata: None,
                norm: None,
            }],
            bm25_index: None,
        };
        assert!(matches!(snap.validate(), Err(VectorStoreError::InvalidSnapshot(_))));
    }
}
