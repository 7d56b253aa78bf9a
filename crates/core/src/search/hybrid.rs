//! Hybrid search fusion strategies.
//!
//! Combines vector search and keyword search results into a single ranked list.
//! Two strategies are available:
//! - **RRF** (Reciprocal Rank Fusion): rank-based, no score normalization needed
//! - **Weighted**: vector similarity used as-is, BM25 min-max normalized, alpha weighting
//!
//! Both inputs must already be sorted best-first. Every fused result carries
//! its original per-source score and 1-based rank when present in that source.

use crate::document::Metadata;
use crate::search::types::{HybridResult, KeywordResult, SearchResult};
use std::collections::HashMap;

#[derive(Default)]
struct Entry<'a> {
    score: f32,
    vector_similarity: Option<f32>,
    keyword_score: Option<f32>,
    vector_rank: Option<usize>,
    keyword_rank: Option<usize>,
    vector_metadata: Option<&'a Metadata>,
    keyword_metadata: Option<&'a Metadata>,
}

/// Reciprocal Rank Fusion: combines ranked lists.
/// score(d) = sum(1 / (rrf_k + rank_i(d)))
pub fn rrf_fusion(
    vector_results: &[SearchResult],
    keyword_results: &[KeywordResult],
    rrf_k: f32,
    k: usize,
) -> Vec<HybridResult> {
    let mut entries = collect_entries(vector_results, keyword_results);
    for e in entries.values_mut() {
        let v = e.vector_rank.map_or(0.0, |r| 1.0 / (rrf_k + r as f32));
        let kw = e.keyword_rank.map_or(0.0, |r| 1.0 / (rrf_k + r as f32));
        e.score = v + kw;
    }
    finish(entries, k)
}

/// Weighted combination.
/// score(d) = alpha * similarity(d) + (1 - alpha) * minmax(bm25(d))
///
/// `alpha` is clamped to `[0, 1]`. When every keyword score is equal the
/// normalized keyword score is 1. Ids missing from a list get 0 for that side.
pub fn weighted_fusion(
    vector_results: &[SearchResult],
    keyword_results: &[KeywordResult],
    alpha: f32,
    k: usize,
) -> Vec<HybridResult> {
    let alpha = if alpha.is_nan() { 0.5 } else { alpha.clamp(0.0, 1.0) };
    let mut entries = collect_entries(vector_results, keyword_results);
    let bounds = min_max(entries.values().filter_map(|e| e.keyword_score));

    for e in entries.values_mut() {
        let v = e.vector_similarity.unwrap_or(0.0);
        let kw = match (e.keyword_score, bounds) {
            (Some(score), Some((min_k, max_k))) => {
                let range = max_k - min_k;
                if range == 0.0 {
                    1.0
                } else {
                    (score - min_k) / range
                }
            }
            _ => 0.0,
        };
        e.score = alpha * v + (1.0 - alpha) * kw;
    }

    finish(entries, k)
}

/// One entry per distinct id, holding per-source scores and ranks.
/// Only the first occurrence of an id within a list counts.
fn collect_entries<'a>(
    vector_results: &'a [SearchResult],
    keyword_results: &'a [KeywordResult],
) -> HashMap<&'a str, Entry<'a>> {
    let mut entries: HashMap<&str, Entry> =
        HashMap::with_capacity(vector_results.len() + keyword_results.len());

    for (rank, r) in vector_results.iter().enumerate() {
        let e = entries.entry(r.id.as_str()).or_default();
        if e.vector_rank.is_none() {
            e.vector_rank = Some(rank + 1);
            e.vector_similarity = Some(r.similarity);
            e.vector_metadata = r.metadata.as_ref();
        }
    }
    for (rank, r) in keyword_results.iter().enumerate() {
        let e = entries.entry(r.id.as_str()).or_default();
        if e.keyword_rank.is_none() {
            e.keyword_rank = Some(rank + 1);
            e.keyword_score = Some(r.score);
            e.keyword_metadata = r.metadata.as_ref();
        }
    }
    entries
}

/// Sort descending by fused score (ties by ascending id) and keep the top `k`.
fn finish(entries: HashMap<&str, Entry<'_>>, k: usize) -> Vec<HybridResult> {
    let mut results: Vec<HybridResult> = entries
        .into_iter()
        .map(|(id, e)| HybridResult {
            id: id.to_string(),
            score: e.score,
            vector_similarity: e.vector_similarity,
            keyword_score: e.keyword_score,
            vector_rank: e.vector_rank,
            keyword_rank: e.keyword_rank,
            metadata: e.vector_metadata.or(e.keyword_metadata).cloned(),
        })
        .collect();
    results.sort_unstable_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
    results.truncate(k);
    results
}

/// Single-pass min/max computation.
fn min_max(scores: impl Iterator<Item = f32>) -> Option<(f32, f32)> {
    scores.fold(None, |acc, s| match acc {
        None => Some((s, s)),
        Some((min, max)) => Some((min.min(s), max.max(s))),
    })
}
