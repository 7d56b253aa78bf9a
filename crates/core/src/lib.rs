//! # vecstore-core
//!
//! Embeddable in-process vector store with exact nearest neighbor search,
//! BM25 keyword search over metadata fields, MongoDB-style metadata filters,
//! and hybrid retrieval fused with RRF or weighted scoring.
//!
//! Stores are plain single-threaded values; [`StoreRegistry`] adds named,
//! independently locked stores for multi-threaded hosts.
//!
//! ```
//! use vecstore_core::{DistanceMetric, HybridSearchOptions, StoreConfig, VectorStore};
//! use serde_json::json;
//!
//! let mut store = VectorStore::new(StoreConfig::new(3, DistanceMetric::Cosine)).unwrap();
//! let meta = vecstore_core::document::metadata_from_value(json!({ "title": "red fox" }));
//! store.insert("a", &[1.0, 0.0, 0.0], meta).unwrap();
//!
//! let opts = HybridSearchOptions::hybrid(vec![1.0, 0.0, 0.0], "fox", 5).with_text_fields(["title"]);
//! let results = store.hybrid_search(&opts).unwrap();
//! assert_eq!(results[0].id, "a");
//! ```

/// BM25 full-text search: tokenizer, inverted index, Okapi BM25 scoring.
pub mod bm25;
/// Tuning constants and runtime configuration structs.
pub mod config;
/// Distance metrics and similarity conversion.
pub mod distance;
/// Stored record type and JSON metadata helpers.
pub mod document;
/// Error type shared by every fallible operation.
pub mod error;
/// Metadata filter tree and its JSON form.
pub mod filter_types;
/// Search primitives: result types, metadata filtering, and hybrid fusion.
pub mod search;
/// Storage layer: vector store, snapshots, persistence, and the store registry.
pub mod storage;

pub use config::{Bm25Config, IndexKind, StoreConfig, TokenizerConfig};
pub use distance::DistanceMetric;
pub use document::{Metadata, VectorRecord};
pub use error::{Result, VectorStoreError};
pub use filter_types::{Condition, FilterOperator, MetadataFilter};
pub use search::{
    FusionMethod, HybridResult, HybridSearchOptions, KeywordResult, SearchMode, SearchResult,
};
pub use storage::{SharedStore, StoreRegistry, StoreSnapshot, StoreStats, VectorStore};
