//! BM25 Okapi scoring engine.
//!
//! Scores documents against already-tokenized query terms using the BM25
//! formula with configurable `k1` and `b`.

use crate::bm25::inverted_index::InvertedIndex;
use ordered_float::OrderedFloat;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// BM25 free parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Params {
    pub k1: f32,
    pub b: f32,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self {
            k1: crate::config::BM25_K1,
            b: crate::config::BM25_B,
        }
    }
}

/// IDF: `ln((N - n + 0.5) / (n + 0.5) + 1)`.
#[inline]
pub fn idf(doc_count: f32, doc_freq: f32) -> f32 {
    ((doc_count - doc_freq + 0.5) / (doc_freq + 0.5) + 1.0).ln()
}

/// BM25 Okapi scoring for query terms against the inverted index.
///
/// Returns up to `k` `(id, score)` pairs with strictly positive score, sorted
/// by descending score (ties by ascending id).
pub fn bm25_search<S: AsRef<str>>(
    index: &InvertedIndex,
    query_terms: &[S],
    k: usize,
    params: Bm25Params,
) -> Vec<(String, f32)> {
    if query_terms.is_empty() || index.doc_count() == 0 || k == 0 {
        return Vec::new();
    }
    let avgdl = index.average_doc_length();
    if avgdl <= 0.0 {
        return Vec::new();
    }

    let n = index.doc_count() as f32;
    let Bm25Params { k1, b } = params;

    let idfs: Vec<(&str, f32)> = query_terms
        .iter()
        .map(|t| {
            let term = t.as_ref();
            (term, idf(n, index.document_frequency(term) as f32))
        })
        .collect();

    // Partial sort: O(n log k) via min-heap of size k
    let mut heap: BinaryHeap<Reverse<(OrderedFloat<f32>, Reverse<&str>)>> =
        BinaryHeap::with_capacity(k + 1);

    for (id, entry) in &index.documents {
        let dl = entry.length as f32;
        let mut score = 0.0f32;
        for &(term, term_idf) in &idfs {
            let tf = match entry.term_frequencies.get(term) {
                Some(&tf) if tf > 0 => tf as f32,
                _ => continue,
            };
            let tf_norm = (tf * (k1 + 1.0)) / (tf + k1 * (1.0 - b + b * dl / avgdl));
            score += term_idf * tf_norm;
        }
        if score > 0.0 {
            heap.push(Reverse((OrderedFloat(score), Reverse(id.as_str()))));
            if heap.len() > k {
                heap.pop();
            }
        }
    }

    let mut results: Vec<(String, f32)> = heap
        .into_iter()
        .map(|Reverse((s, Reverse(id)))| (id.to_string(), s.0))
        .collect();
    results.sort_unstable_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    results
}
