//! Search primitives: result types, metadata filtering and hybrid fusion.

/// Metadata filter evaluation and dot-path resolution.
pub mod filter;
/// Reciprocal Rank Fusion and weighted score fusion.
pub mod hybrid;
/// Request options and result types.
pub mod types;

pub use filter::{matches_filter, resolve_path};
pub use hybrid::{rrf_fusion, weighted_fusion};
pub use types::{
    FusionMethod, HybridResult, HybridSearchOptions, KeywordResult, SearchMode, SearchResult,
};
