//! Inverted statistics for BM25 full-text search.
//!
//! Keeps a term-frequency map per document, a global document-frequency map
//! and the running token total used for the average document length. These
//! statistics are all BM25 needs, so the index never stores document text.

use std::collections::HashMap;

/// Term statistics for one indexed document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentEntry {
    /// Number of tokens in the document.
    pub length: u32,
    /// term → occurrences in this document.
    pub term_frequencies: HashMap<String, u32>,
}

/// Per-document term frequencies plus global document frequencies.
///
/// Supports incremental document addition and removal. Re-adding an id
/// replaces its previous entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvertedIndex {
    /// document id → term statistics
    pub documents: HashMap<String, DocumentEntry>,
    /// term → number of documents containing it
    pub document_frequencies: HashMap<String, u32>,
    /// Sum of all document lengths (for average calculation)
    pub total_doc_length: u64,
}

impl InvertedIndex {
    /// Creates a new empty inverted index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Index a document's tokens under `id`, replacing any previous entry.
    pub fn add_document<I, S>(&mut self, id: &str, tokens: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.remove_document(id);

        let mut entry = DocumentEntry::default();
        for token in tokens {
            *entry
                .term_frequencies
                .entry(token.as_ref().to_string())
                .or_insert(0) += 1;
            entry.length += 1;
        }

        for term in entry.term_frequencies.keys() {
            *self.document_frequencies.entry(term.clone()).or_insert(0) += 1;
        }
        self.total_doc_length += entry.length as u64;
        self.documents.insert(id.to_string(), entry);
    }

    /// Insert a prebuilt entry (used when restoring snapshots).
    ///
    /// Document frequencies are left untouched; the caller restores them
    /// separately.
    pub fn insert_entry(&mut self, id: String, entry: DocumentEntry) {
        self.total_doc_length += entry.length as u64;
        if let Some(old) = self.documents.insert(id, entry) {
            self.total_doc_length -= old.length as u64;
        }
    }

    /// Remove a document. Returns `true` if it was indexed.
    pub fn remove_document(&mut self, id: &str) -> bool {
        let Some(entry) = self.documents.remove(id) else {
            return false;
        };
        for term in entry.term_frequencies.keys() {
            if let Some(df) = self.document_frequencies.get_mut(term) {
                *df = df.saturating_sub(1);
                if *df == 0 {
                    self.document_frequencies.remove(term);
                }
            }
        }
        self.total_doc_length = self.total_doc_length.saturating_sub(entry.length as u64);
        true
    }

    /// Whether `id` has an entry.
    pub fn contains(&self, id: &str) -> bool {
        self.documents.contains_key(id)
    }

    /// Number of indexed documents.
    pub fn doc_count(&self) -> usize {
        self.documents.len()
    }

    /// Number of documents containing `term`.
    pub fn document_frequency(&self, term: &str) -> u32 {
        self.document_frequencies.get(term).copied().unwrap_or(0)
    }

    /// Returns the average document length across all indexed documents.
    pub fn average_doc_length(&self) -> f32 {
        if self.documents.is_empty() {
            return 0.0;
        }
        self.total_doc_length as f32 / self.documents.len() as f32
    }

    /// Empties all state.
    pub fn clear(&mut self) {
        self.documents.clear();
        self.document_frequencies.clear();
        self.total_doc_length = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(text: &str) -> Vec<&str> {
        text.split_whitespace().collect()
    }

    #[test]
    fn test_add_document_updates_index() {
        let mut idx = InvertedIndex::new();
        idx.add_document("a", words("the quick brown fox"));
        assert_eq!(idx.doc_count(), 1);
        assert_eq!(idx.document_frequency("quick"), 1);
        assert_eq!(idx.documents["a"].length, 4);
    }

    #[test]
    fn test_term_frequency() {
        let mut idx = InvertedIndex::new();
        idx.add_document("a", words("hello hello hello world"));
        assert_eq!(idx.documents["a"].term_frequencies["hello"], 3);
        // DF counts documents, not occurrences
        assert_eq!(idx.document_frequency("hello"), 1);
    }

    #[test]
    fn test_multiple_documents() {
        let mut idx = InvertedIndex::new();
        idx.add_document("a", words("rust programming language"));
        idx.add_document("b", words("python programming language"));
        assert_eq!(idx.doc_count(), 2);
        assert_eq!(idx.document_frequency("programming"), 2);
        assert_eq!(idx.document_frequency("rust"), 1);
    }

    #[test]
    fn test_remove_document() {
        let mut idx = InvertedIndex::new();
        idx.add_document("a", words("hello world"));
        idx.add_document("b", words("hello rust"));
        assert!(idx.remove_document("a"));
        assert_eq!(idx.doc_count(), 1);
        assert!(!idx.document_frequencies.contains_key("world"));
        assert_eq!(idx.document_frequency("hello"), 1);
        assert_eq!(idx.total_doc_length, 2);
    }

    #[test]
    fn test_remove_nonexistent_doc() {
        let mut idx = InvertedIndex::new();
        idx.add_document("a", words("hello world"));
        assert!(!idx.remove_document("zzz"));
        assert_eq!(idx.doc_count(), 1);
    }

    #[test]
    fn test_readd_replaces() {
        let mut idx = InvertedIndex::new();
        idx.add_document("a", words("red fox"));
        idx.add_document("a", words("blue dog dog"));
        assert_eq!(idx.doc_count(), 1);
        assert_eq!(idx.document_frequency("fox"), 0);
        assert_eq!(idx.document_frequency("dog"), 1);
        assert_eq!(idx.total_doc_length, 3);
    }

    #[test]
    fn test_empty_document_occupies_entry() {
        let mut idx = InvertedIndex::new();
        idx.add_document("a", Vec::<String>::new());
        assert!(idx.contains("a"));
        assert_eq!(idx.documents["a"].length, 0);
        assert_eq!(idx.average_doc_length(), 0.0);
    }

    #[test]
    fn test_average_doc_length() {
        let mut idx = InvertedIndex::new();
        assert_eq!(idx.average_doc_length(), 0.0);
        idx.add_document("a", words("one two three"));
        idx.add_document("b", words("four five six seven eight"));
        assert!((idx.average_doc_length() - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_clear() {
        let mut idx = InvertedIndex::new();
        idx.add_document("a", words("one two"));
        idx.clear();
        assert_eq!(idx, InvertedIndex::new());
    }
}
