//! BM25 full-text search over metadata text fields.
//!
//! The tokenizer turns text into terms, the inverted index keeps per-document
//! term statistics, the scorer ranks documents with Okapi BM25, and
//! [`Bm25Index`] ties them to a set of metadata fields.

/// Field extraction, incremental indexing and snapshots.
pub mod index;
/// Term and document frequency statistics.
pub mod inverted_index;
/// Okapi BM25 scoring and top-k selection.
pub mod scorer;
/// Configurable text tokenizer.
pub mod tokenizer;

pub use index::{Bm25Index, Bm25Stats};
pub use inverted_index::{DocumentEntry, InvertedIndex};
pub use scorer::{bm25_search, idf, Bm25Params};
pub use tokenizer::{tokenize, Tokenizer};
