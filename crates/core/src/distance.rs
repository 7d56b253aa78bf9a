//! Distance metric implementations for exact vector search.
//!
//! Supports three distance functions: cosine, euclidean (L2), and dot product.
//! All metrics return a distance where **lower is better** (more similar), so the
//! store can rank every metric with the same ascending sort. Similarity values
//! derived from distances are for display only.
//!
//! Inputs should have equal length (the store checks dimensions before calling
//! in); extra trailing components of the longer slice are ignored.

use serde::{Deserialize, Serialize};

/// Distance metric used for vector similarity computation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DistanceMetric {
    /// Cosine distance: `1 - cosine_similarity`. Range: \[0, 2\].
    #[default]
    #[serde(rename = "cosine")]
    Cosine,
    /// Euclidean distance (L2). Range: \[0, ∞).
    #[serde(rename = "euclidean")]
    Euclidean,
    /// Negative dot product: `-dot(a, b)`. Lower = higher similarity.
    #[serde(rename = "dot", alias = "dotProduct")]
    DotProduct,
}

impl DistanceMetric {
    /// Distance between two vectors. For cosine, precomputed norms are used when given.
    #[inline]
    pub fn distance(&self, a: &[f32], b: &[f32], norm_a: Option<f32>, norm_b: Option<f32>) -> f32 {
        match self {
            DistanceMetric::Cosine => cosine_distance(a, b, norm_a, norm_b),
            DistanceMetric::Euclidean => euclidean_distance(a, b),
            DistanceMetric::DotProduct => dot_product_distance(a, b),
        }
    }

    /// Convert a distance into a higher-is-better similarity for display.
    ///
    /// Cosine: `1 - d`. Dot product: `-d` (undoes the negation). Euclidean: `1 / (1 + d)`.
    #[inline]
    pub fn similarity(&self, distance: f32) -> f32 {
        match self {
            DistanceMetric::Cosine => 1.0 - distance,
            DistanceMetric::Euclidean => 1.0 / (1.0 + distance),
            DistanceMetric::DotProduct => -distance,
        }
    }

    /// Whether records in a store with this metric carry a cached norm.
    pub fn caches_norm(&self) -> bool {
        matches!(self, DistanceMetric::Cosine)
    }

    /// Wire name used in snapshots and stats.
    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceMetric::Cosine => "cosine",
            DistanceMetric::Euclidean => "euclidean",
            DistanceMetric::DotProduct => "dot",
        }
    }
}

impl std::fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dot product between two f32 slices.
#[inline]
pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Euclidean norm of a vector.
#[inline]
pub fn vector_norm(v: &[f32]) -> f32 {
    dot_product(v, v).sqrt()
}

/// Cosine distance `1 - clamp(dot / (|a| |b|), -1, 1)`.
///
/// Norms are computed when not supplied. Returns `1.0` when either norm is zero.
pub fn cosine_distance(a: &[f32], b: &[f32], norm_a: Option<f32>, norm_b: Option<f32>) -> f32 {
    let dot = dot_product(a, b);
    let na = norm_a.unwrap_or_else(|| vector_norm(a));
    let nb = norm_b.unwrap_or_else(|| vector_norm(b));
    if na == 0.0 || nb == 0.0 {
        return 1.0;
    }
    let cos = (dot / (na * nb)).clamp(-1.0, 1.0);
    1.0 - cos
}

/// Euclidean (L2) distance.
#[inline]
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum::<f32>()
        .sqrt()
}

/// Negated dot product, so that ascending distance means ascending relevance.
#[inline]
pub fn dot_product_distance(a: &[f32], b: &[f32]) -> f32 {
    -dot_product(a, b)
}
