//! Search request and result types.

use crate::config::{DEFAULT_ALPHA, DEFAULT_K, RRF_K};
use crate::document::Metadata;
use crate::filter_types::MetadataFilter;
use serde::{Deserialize, Serialize};

/// A nearest-neighbor match.
///
/// Results are ordered by ascending `distance`; `similarity` is derived from it
/// for display and for `min_similarity` cut-offs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub id: String,
    pub distance: f32,
    pub similarity: f32,
    pub metadata: Option<Metadata>,
}

/// A BM25 match with the record's current metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordResult {
    pub id: String,
    pub score: f32,
    pub metadata: Option<Metadata>,
}

/// Uniform result shape for every search mode.
///
/// `score` is the similarity (vector mode), the BM25 score (keyword mode) or
/// the fused score (hybrid mode). Per-source fields are `None` when the id did
/// not appear in that source. Ranks are 1-based.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HybridResult {
    pub id: String,
    pub score: f32,
    pub vector_similarity: Option<f32>,
    pub keyword_score: Option<f32>,
    pub vector_rank: Option<usize>,
    pub keyword_rank: Option<usize>,
    pub metadata: Option<Metadata>,
}

/// Which sub-searches a hybrid-search call runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    Vector,
    Keyword,
    #[default]
    Hybrid,
}

/// How hybrid mode combines the two ranked lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FusionMethod {
    /// Reciprocal Rank Fusion.
    #[default]
    Rrf,
    /// `alpha * similarity + (1 - alpha) * minmax(bm25)`.
    #[serde(alias = "linear")]
    Weighted,
}

/// Options for [`VectorStore::hybrid_search`](crate::storage::VectorStore::hybrid_search).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HybridSearchOptions {
    pub mode: SearchMode,
    pub query_vector: Option<Vec<f32>>,
    pub query_text: Option<String>,
    pub k: usize,
    pub filter: Option<MetadataFilter>,
    /// Applied to the vector side only.
    pub min_similarity: Option<f32>,
    /// Text fields for the BM25 index. Configures (or reconfigures) the index
    /// when they differ from the current ones.
    pub text_fields: Option<Vec<String>>,
    pub fusion: FusionMethod,
    /// Vector weight for [`FusionMethod::Weighted`], clamped to `[0, 1]`.
    pub alpha: f32,
    /// `k` constant for [`FusionMethod::Rrf`].
    pub rrf_constant: f32,
}

impl Default for HybridSearchOptions {
    fn default() -> Self {
        Self {
            mode: SearchMode::default(),
            query_vector: None,
            query_text: None,
            k: DEFAULT_K,
            filter: None,
            min_similarity: None,
            text_fields: None,
            fusion: FusionMethod::default(),
            alpha: DEFAULT_ALPHA,
            rrf_constant: RRF_K,
        }
    }
}

impl HybridSearchOptions {
    /// Vector-only search.
    pub fn vector(query: Vec<f32>, k: usize) -> Self {
        Self {
            mode: SearchMode::Vector,
            query_vector: Some(query),
            k,
            ..Self::default()
        }
    }

    /// Keyword-only search.
    pub fn keyword(query: impl Into<String>, k: usize) -> Self {
        Self {
            mode: SearchMode::Keyword,
            query_text: Some(query.into()),
            k,
            ..Self::default()
        }
    }

    /// Vector + keyword search fused with RRF by default.
    pub fn hybrid(query: Vec<f32>, text: impl Into<String>, k: usize) -> Self {
        Self {
            mode: SearchMode::Hybrid,
            query_vector: Some(query),
            query_text: Some(text.into()),
            k,
            ..Self::default()
        }
    }

    pub fn with_filter(mut self, filter: MetadataFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_min_similarity(mut self, min_similarity: f32) -> Self {
        self.min_similarity = Some(min_similarity);
        self
    }

    pub fn with_text_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.text_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_fusion(mut self, fusion: FusionMethod) -> Self {
        self.fusion = fusion;
        self
    }

    /// Switch to weighted fusion with the given vector weight.
    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.fusion = FusionMethod::Weighted;
        self.alpha = alpha;
        self
    }

    pub fn with_rrf_constant(mut self, rrf_constant: f32) -> Self {
        self.rrf_constant = rrf_constant;
        self
    }

    /// Query text with surrounding whitespace removed; empty text counts as absent.
    pub(crate) fn text(&self) -> Option<&str> {
        self.query_text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}
