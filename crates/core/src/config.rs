//! Configuration for vecstore.
//!
//! Tuning constants live here as compile-time values. Runtime configuration
//! (store shape, BM25 parameters, tokenizer options) is expressed as serde
//! structs so a host can pass them straight through from JSON.

use crate::distance::DistanceMetric;
use crate::error::{Result, VectorStoreError};
use serde::{Deserialize, Serialize};

/// BM25 Okapi term frequency saturation parameter.
///
/// Controls how quickly term frequency saturates. Higher values allow TF to grow more.
/// Standard value is 1.2 (range: 1.0–2.0).
pub const BM25_K1: f32 = 1.2;

/// BM25 Okapi document length normalization parameter.
///
/// Controls the impact of document length on scoring. 0.0 = no normalization,
/// 1.0 = full normalization. Standard value is 0.75.
pub const BM25_B: f32 = 0.75;

/// Reciprocal Rank Fusion (RRF) constant `k`.
///
/// Used in the formula `1 / (k + rank)` to combine ranked lists.
/// Standard value is 60.0 (from the original RRF paper).
pub const RRF_K: f32 = 60.0;

/// Default number of results when a request does not name one.
pub const DEFAULT_K: usize = 10;

/// Default vector weight for weighted hybrid fusion.
pub const DEFAULT_ALPHA: f32 = 0.5;

/// Keyword-only searches fetch `k * KEYWORD_OVERSAMPLE` candidates before
/// applying the metadata filter.
pub const KEYWORD_OVERSAMPLE: usize = 2;

/// Hybrid searches fetch `max(k * HYBRID_OVERSAMPLE, HYBRID_MIN_CANDIDATES)`
/// candidates from each side before fusing.
pub const HYBRID_OVERSAMPLE: usize = 3;

/// Lower bound on per-side candidates in hybrid search.
pub const HYBRID_MIN_CANDIDATES: usize = 50;

/// Version tag written into store snapshots.
pub const SNAPSHOT_VERSION: &str = "1.0";

/// Version tag written into BM25 index snapshots.
pub const BM25_SNAPSHOT_VERSION: &str = "1.0";

/// Index structure backing vector search.
///
/// Only the flat (exhaustive) scan is implemented. `Hnsw` is accepted and
/// persisted so snapshots from hosts that request it still load, but searches
/// run against the flat scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    /// Exact linear scan over every stored vector.
    #[default]
    Flat,
    /// Approximate graph index (served by the flat scan).
    Hnsw,
}

/// Immutable shape of a vector store.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreConfig {
    /// Length every stored vector must have.
    pub dimensions: usize,
    /// Distance metric used for ranking.
    #[serde(default)]
    pub metric: DistanceMetric,
    /// Index structure backing search.
    #[serde(default)]
    pub index_kind: IndexKind,
}

impl StoreConfig {
    /// Creates a flat-index config.
    pub fn new(dimensions: usize, metric: DistanceMetric) -> Self {
        Self {
            dimensions,
            metric,
            index_kind: IndexKind::Flat,
        }
    }

    /// Builder-style index kind override.
    pub fn with_index_kind(mut self, index_kind: IndexKind) -> Self {
        self.index_kind = index_kind;
        self
    }

    /// Rejects configurations no store can be built from.
    pub fn validate(&self) -> Result<()> {
        if self.dimensions == 0 {
            return Err(VectorStoreError::InvalidConfig(
                "dimensions must be a positive integer".to_string(),
            ));
        }
        Ok(())
    }
}

/// Tokenizer options shared by indexing and querying.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TokenizerConfig {
    /// Lowercase input before splitting.
    pub lowercase: bool,
    /// Treat every character that is not a letter, number or whitespace as a separator.
    pub remove_punctuation: bool,
    /// Delete numeric characters from tokens.
    pub remove_numbers: bool,
    /// Tokens shorter than this many characters are dropped.
    pub min_token_length: usize,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            lowercase: true,
            remove_punctuation: true,
            remove_numbers: false,
            min_token_length: 1,
        }
    }
}

/// BM25 index parameters and the metadata fields it reads text from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Bm25Config {
    /// Term frequency saturation.
    pub k1: f32,
    /// Document length normalization.
    pub b: f32,
    /// Metadata fields concatenated (in order) to form a document's text.
    pub text_fields: Vec<String>,
    /// Tokenizer options.
    pub tokenizer: TokenizerConfig,
}

impl Default for Bm25Config {
    fn default() -> Self {
        Self {
            k1: BM25_K1,
            b: BM25_B,
            text_fields: Vec::new(),
            tokenizer: TokenizerConfig::default(),
        }
    }
}

impl Bm25Config {
    /// Default parameters over the given text fields.
    pub fn with_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            text_fields: fields.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Rejects a non-finite or negative `k1` and any `b` outside `[0, 1]`.
    pub fn validate(&self) -> Result<()> {
        if !self.k1.is_finite() || self.k1 < 0.0 {
            return Err(VectorStoreError::InvalidConfig(format!(
                "k1 must be a finite non-negative number, got {}",
                self.k1
            )));
        }
        // b > 1 drives the length normalization negative for short documents
        if !(0.0..=1.0).contains(&self.b) {
            return Err(VectorStoreError::InvalidConfig(format!(
                "b must be within [0, 1], got {}",
                self.b
            )));
        }
        Ok(())
    }
}
