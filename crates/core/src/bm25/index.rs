//! BM25 keyword index over metadata text fields.
//!
//! [`Bm25Index`] pulls text out of the configured metadata fields, tokenizes
//! it and maintains [`InvertedIndex`] statistics. It never keeps the metadata
//! itself; callers that need it for display resolve ids against their own
//! record store.

use crate::bm25::inverted_index::{DocumentEntry, InvertedIndex};
use crate::bm25::scorer::{bm25_search, Bm25Params};
use crate::bm25::tokenizer::Tokenizer;
use crate::config::{Bm25Config, BM25_SNAPSHOT_VERSION};
use crate::document::Metadata;
use crate::error::{Result, VectorStoreError};
use crate::search::filter::resolve_path;
use crate::storage::snapshot::{Bm25DocumentSnapshot, Bm25Snapshot};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// Summary statistics reported by [`Bm25Index::stats`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bm25Stats {
    pub document_count: usize,
    pub vocabulary_size: usize,
    pub avg_doc_length: f32,
    pub k1: f32,
    pub b: f32,
    pub text_fields: Vec<String>,
}

/// Ranked keyword index over a fixed list of metadata fields.
#[derive(Debug, Clone)]
pub struct Bm25Index {
    config: Bm25Config,
    tokenizer: Tokenizer,
    index: InvertedIndex,
}

impl Bm25Index {
    /// Creates an empty index. Fails if `k1`/`b` are invalid.
    pub fn new(config: Bm25Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            tokenizer: Tokenizer::new(config.tokenizer.clone()),
            config,
            index: InvertedIndex::new(),
        })
    }

    /// Index parameters.
    pub fn config(&self) -> &Bm25Config {
        &self.config
    }

    /// Metadata fields this index reads.
    pub fn text_fields(&self) -> &[String] {
        &self.config.text_fields
    }

    /// Underlying statistics.
    pub fn inverted_index(&self) -> &InvertedIndex {
        &self.index
    }

    /// Concatenate the configured fields' text, in field order, with single spaces.
    ///
    /// String values are used verbatim; arrays contribute their string
    /// elements; everything else is ignored.
    pub fn extract_text(&self, metadata: Option<&Metadata>) -> String {
        let mut parts: Vec<&str> = Vec::new();
        for field in &self.config.text_fields {
            match resolve_path(metadata, field) {
                Some(Value::String(s)) => parts.push(s),
                Some(Value::Array(items)) => {
                    parts.extend(items.iter().filter_map(Value::as_str));
                }
                _ => {}
            }
        }
        parts.join(" ")
    }

    /// Index a document, replacing any previous entry under the same id.
    pub fn add_document(&mut self, id: &str, metadata: Option<&Metadata>) {
        let text = self.extract_text(metadata);
        let tokens = self.tokenizer.tokenize(&text);
        self.index.add_document(id, &tokens);
    }

    /// Re-index a document (full replace).
    pub fn update_document(&mut self, id: &str, metadata: Option<&Metadata>) {
        self.add_document(id, metadata);
    }

    /// Remove a document. Returns `true` if it was indexed.
    pub fn remove_document(&mut self, id: &str) -> bool {
        self.index.remove_document(id)
    }

    /// Whether `id` is indexed.
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains(id)
    }

    /// Number of indexed documents.
    pub fn document_count(&self) -> usize {
        self.index.doc_count()
    }

    /// Top-`k` documents for `query`, as `(id, score)` with score > 0, best first.
    pub fn search(&self, query: &str, k: usize) -> Vec<(String, f32)> {
        let terms = self.tokenizer.tokenize(query);
        bm25_search(
            &self.index,
            &terms,
            k,
            Bm25Params {
                k1: self.config.k1,
                b: self.config.b,
            },
        )
    }

    /// Empties all state; configuration is kept.
    pub fn clear(&mut self) {
        self.index.clear();
    }

    pub fn stats(&self) -> Bm25Stats {
        Bm25Stats {
            document_count: self.index.doc_count(),
            vocabulary_size: self.index.document_frequencies.len(),
            avg_doc_length: self.index.average_doc_length(),
            k1: self.config.k1,
            b: self.config.b,
            text_fields: self.config.text_fields.clone(),
        }
    }

    /// Rough heap footprint in bytes.
    pub fn estimate_memory_bytes(&self) -> usize {
        let mut total = 0usize;
        for (id, entry) in &self.index.documents {
            total += id.len() + 48;
            for term in entry.term_frequencies.keys() {
                total += term.len() + 32; // String + u32 + HashMap overhead
            }
        }
        for term in self.index.document_frequencies.keys() {
            total += term.len() + 32;
        }
        total
    }

    /// Capture scoring state without the original text.
    pub fn to_snapshot(&self) -> Bm25Snapshot {
        let mut documents: Vec<Bm25DocumentSnapshot> = self
            .index
            .documents
            .iter()
            .map(|(id, entry)| Bm25DocumentSnapshot {
                id: id.clone(),
                length: entry.length,
                term_frequencies: entry.term_frequencies.clone().into_iter().collect(),
            })
            .collect();
        documents.sort_by(|a, b| a.id.cmp(&b.id));

        Bm25Snapshot {
            version: BM25_SNAPSHOT_VERSION.to_string(),
            k1: self.config.k1,
            b: self.config.b,
            text_fields: self.config.text_fields.clone(),
            avg_doc_length: self.index.average_doc_length(),
            document_count: self.index.doc_count(),
            documents,
            document_frequencies: self
                .index
                .document_frequencies
                .clone()
                .into_iter()
                .collect(),
            tokenizer: Some(self.config.tokenizer.clone()),
        }
    }

    /// Rebuild an index from a snapshot without re-tokenizing.
    ///
    /// Document frequencies are recomputed from the per-document term maps and
    /// must agree with the snapshot's `documentFrequencies`.
    pub fn from_snapshot(snapshot: Bm25Snapshot) -> Result<Self> {
        let config = Bm25Config {
            k1: snapshot.k1,
            b: snapshot.b,
            text_fields: snapshot.text_fields,
            tokenizer: snapshot.tokenizer.unwrap_or_default(),
        };
        let mut index = Self::new(config)?;

        if snapshot.document_count != snapshot.documents.len() {
            return Err(VectorStoreError::InvalidSnapshot(format!(
                "bm25 documentCount {} != documents length {}",
                snapshot.document_count,
                snapshot.documents.len()
            )));
        }

        for doc in snapshot.documents {
            if index.index.contains(&doc.id) {
                return Err(VectorStoreError::InvalidSnapshot(format!(
                    "bm25 document '{}' appears more than once",
                    doc.id
                )));
            }
            index.index.insert_entry(
                doc.id,
                DocumentEntry {
                    length: doc.length,
                    term_frequencies: doc.term_frequencies.into_iter().collect(),
                },
            );
        }

        let mut rebuilt: HashMap<String, u32> = HashMap::new();
        for entry in index.index.documents.values() {
            for term in entry.term_frequencies.keys() {
                *rebuilt.entry(term.clone()).or_insert(0) += 1;
            }
        }
        if rebuilt.len() != snapshot.document_frequencies.len() {
            return Err(VectorStoreError::InvalidSnapshot(format!(
                "bm25 documentFrequencies has {} terms, documents contain {}",
                snapshot.document_frequencies.len(),
                rebuilt.len()
            )));
        }
        for (term, &df) in &snapshot.document_frequencies {
            let actual = rebuilt.get(term).copied().unwrap_or(0);
            if actual != df {
                return Err(VectorStoreError::InvalidSnapshot(format!(
                    "bm25 document frequency for '{}' is {}, documents contain {}",
                    term, df, actual
                )));
            }
        }
        index.index.document_frequencies = rebuilt;
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::metadata_from_value;
    use serde_json::json;

    fn index_with(fields: &[&str]) -> Bm25Index {
        Bm25Index::new(Bm25Config::with_fields(fields.iter().copied())).unwrap()
    }

    fn meta(v: Value) -> Option<Metadata> {
        metadata_from_value(v)
    }

    #[test]
    fn test_extract_text_field_order_and_types() {
        let idx = index_with(&["title", "tags", "count", "missing", "info.summary"]);
        let m = meta(json!({
            "title": "Red Fox",
            "tags": ["wild", 3, "animal"],
            "count": 7,
            "info": { "summary": "nested text" }
        }));
        assert_eq!(idx.extract_text(m.as_ref()), "Red Fox wild animal nested text");
    }

    #[test]
    fn test_single_doc_found_then_removed() {
        let mut idx = index_with(&["title"]);
        idx.add_document("x", meta(json!({ "title": "fox" })).as_ref());
        let results = idx.search("fox", 10);
        assert_eq!(results.len(), 1);
        assert!(results[0].1 > 0.0);
        assert!(idx.remove_document("x"));
        assert!(idx.search("fox", 10).is_empty());
    }

    #[test]
    fn test_red_fox_blue_dog() {
        let mut idx = index_with(&["title"]);
        idx.add_document("x", meta(json!({ "title": "red fox" })).as_ref());
        idx.add_document("y", meta(json!({ "title": "blue dog" })).as_ref());
        let results = idx.search("fox", 10);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, "x");
    }

    #[test]
    fn test_update_replaces_terms() {
        let mut idx = index_with(&["title"]);
        idx.add_document("x", meta(json!({ "title": "red fox" })).as_ref());
        idx.update_document("x", meta(json!({ "title": "blue whale" })).as_ref());
        assert_eq!(idx.document_count(), 1);
        assert!(idx.search("fox", 10).is_empty());
        assert_eq!(idx.search("whale", 10)[0].0, "x");
    }

    #[test]
    fn test_document_without_text_has_zero_length_entry() {
        let mut idx = index_with(&["title"]);
        idx.add_document("empty", None);
        assert!(idx.contains("empty"));
        assert_eq!(idx.inverted_index().documents["empty"].length, 0);
    }

    #[test]
    fn test_case_insensitive_query() {
        let mut idx = index_with(&["body"]);
        idx.add_document("a", meta(json!({ "body": "Rust Programming" })).as_ref());
        assert_eq!(idx.search("RUST", 10).len(), 1);
    }

    #[test]
    fn test_clear_keeps_config() {
        let mut idx = index_with(&["title"]);
        idx.add_document("x", meta(json!({ "title": "fox" })).as_ref());
        idx.clear();
        assert_eq!(idx.document_count(), 0);
        assert_eq!(idx.text_fields(), ["title".to_string()]);
    }

    #[test]
    fn test_stats() {
        let mut idx = index_with(&["title"]);
        idx.add_document("x", meta(json!({ "title": "red fox" })).as_ref());
        idx.add_document("y", meta(json!({ "title": "red dog dog dog" })).as_ref());
        let stats = idx.stats();
        assert_eq!(stats.document_count, 2);
        assert_eq!(stats.vocabulary_size, 3);
        assert!((stats.avg_doc_length - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_snapshot_restores_identical_scores() {
        let mut idx = index_with(&["title"]);
        idx.add_document("a", meta(json!({ "title": "rust systems programming" })).as_ref());
        idx.add_document("b", meta(json!({ "title": "python programming" })).as_ref());
        idx.add_document("c", meta(json!({ "title": "rust rust memory" })).as_ref());

        let restored = Bm25Index::from_snapshot(idx.to_snapshot()).unwrap();
        let before = idx.search("rust programming", 10);
        let after = restored.search("rust programming", 10);
        assert_eq!(before.len(), after.len());
        for (x, y) in before.iter().zip(&after) {
            assert_eq!(x.0, y.0);
            assert!((x.1 - y.1).abs() < 1e-6);
        }
        assert_eq!(restored.inverted_index(), idx.inverted_index());
    }

    #[test]
    fn test_snapshot_count_mismatch_rejected() {
        let mut snap = index_with(&["title"]).to_snapshot();
        snap.document_count = 3;
        assert!(matches!(
            Bm25Index::from_snapshot(snap),
            Err(VectorStoreError::InvalidSnapshot(_))
        ));
    }

    #[test]
    fn test_snapshot_document_frequency_mismatch_rejected() {
        let mut idx = index_with(&["title"]);
        idx.add_document("x", meta(json!({ "title": "red fox" })).as_ref());
        idx.add_document("y", meta(json!({ "title": "blue dog" })).as_ref());

        let mut cleared = idx.to_snapshot();
        cleared.document_frequencies.clear();
        assert!(matches!(
            Bm25Index::from_snapshot(cleared),
            Err(VectorStoreError::InvalidSnapshot(_))
        ));

        let mut skewed = idx.to_snapshot();
        *skewed.document_frequencies.get_mut("fox").unwrap() = 2;
        assert!(matches!(
            Bm25Index::from_snapshot(skewed),
            Err(VectorStoreError::InvalidSnapshot(_))
        ));

        let mut extra = idx.to_snapshot();
        extra.document_frequencies.insert("wolf".to_string(), 1);
        assert!(Bm25Index::from_snapshot(extra).is_err());
    }

    #[test]
    fn test_snapshot_with_out_of_range_b_rejected() {
        let mut snap = index_with(&["title"]).to_snapshot();
        snap.b = 5.0;
        assert!(matches!(
            Bm25Index::from_snapshot(snap),
            Err(VectorStoreError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_short_documents_still_match_at_full_length_normalization() {
        let mut idx = Bm25Index::new(Bm25Config {
            b: 1.0,
            ..Bm25Config::with_fields(["title"])
        })
        .unwrap();
        idx.add_document("one", meta(json!({ "title": "fox" })).as_ref());
        idx.add_document("two", meta(json!({ "title": "fox fox" })).as_ref());
        let long: Vec<String> = (0..20).map(|i| format!("word{i}")).collect();
        idx.add_document("long", meta(json!({ "title": long.join(" ") })).as_ref());

        let hits = idx.search("fox", 10);
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|(_, score)| score.is_finite() && *score > 0.0));
    }
}
