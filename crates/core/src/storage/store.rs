//! The vector store: records, exact nearest-neighbor search, optional BM25
//! index and the hybrid search entry point.
//!
//! A [`VectorStore`] is a plain single-threaded value. Mutations take
//! `&mut self` and reads take `&self`, so sharing one across threads needs an
//! external lock (see [`StoreRegistry`](crate::storage::StoreRegistry), which
//! wraps each store in its own `RwLock`).
//!
//! Every record write goes through [`VectorStore::put`] and every removal
//! through [`VectorStore::take`]. Those two functions are the only places that
//! touch the record map, and both keep the BM25 index in step.

use crate::bm25::{Bm25Index, Bm25Stats};
use crate::config::{
    Bm25Config, IndexKind, StoreConfig, HYBRID_MIN_CANDIDATES, HYBRID_OVERSAMPLE,
    KEYWORD_OVERSAMPLE, SNAPSHOT_VERSION,
};
use crate::distance::{vector_norm, DistanceMetric};
use crate::document::{Metadata, VectorRecord};
use crate::error::{Result, VectorStoreError};
use crate::filter_types::MetadataFilter;
use crate::search::filter::matches_filter;
use crate::search::hybrid::{rrf_fusion, weighted_fusion};
use crate::search::types::{
    FusionMethod, HybridResult, HybridSearchOptions, KeywordResult, SearchMode, SearchResult,
};
use crate::storage::snapshot::{StoreSnapshot, VectorSnapshot};
use ordered_float::OrderedFloat;
use serde::Serialize;
use std::collections::{BinaryHeap, HashMap};

/// Summary returned by [`VectorStore::stats`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub dimensions: usize,
    pub distance_metric: DistanceMetric,
    pub index_kind: IndexKind,
    pub vector_count: usize,
    pub approximate_memory_footprint: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bm25_stats: Option<Bm25Stats>,
}

/// In-memory vector store with exact search and an optional BM25 index.
#[derive(Debug, Clone)]
pub struct VectorStore {
    config: StoreConfig,
    records: HashMap<String, VectorRecord>,
    bm25: Option<Bm25Index>,
}

impl VectorStore {
    /// Creates an empty store. Fails if `dimensions == 0`.
    pub fn new(config: StoreConfig) -> Result<Self> {
        config.validate()?;
        if config.index_kind == IndexKind::Hnsw {
            tracing::warn!(
                "index kind 'hnsw' requested for a {}-dimensional store; serving searches with the flat index",
                config.dimensions
            );
        }
        Ok(Self {
            config,
            records: HashMap::new(),
            bm25: None,
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    pub fn metric(&self) -> DistanceMetric {
        self.config.metric
    }

    pub fn index_kind(&self) -> IndexKind {
        self.config.index_kind
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Every stored or query vector passes through here: the length must match
    /// and every component must be finite (snapshots cannot encode NaN or inf).
    fn check_vector(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.config.dimensions {
            return Err(VectorStoreError::DimensionMismatch {
                expected: self.config.dimensions,
                actual: vector.len(),
            });
        }
        if let Some(index) = vector.iter().position(|x| !x.is_finite()) {
            return Err(VectorStoreError::NonFiniteVector { index });
        }
        Ok(())
    }

    /// Store a record, replacing any record with the same id. Caches the norm
    /// for cosine stores and (re)indexes the record in BM25 when configured.
    fn put(&mut self, mut record: VectorRecord) -> Option<VectorRecord> {
        record.norm = self
            .config
            .metric
            .caches_norm()
            .then(|| vector_norm(&record.vector));
        if let Some(ref mut bm25) = self.bm25 {
            bm25.add_document(&record.id, record.metadata.as_ref());
        }
        self.records.insert(record.id.clone(), record)
    }

    /// Remove a record and its BM25 entry.
    fn take(&mut self, id: &str) -> Option<VectorRecord> {
        let removed = self.records.remove(id)?;
        if let Some(ref mut bm25) = self.bm25 {
            bm25.remove_document(id);
        }
        Some(removed)
    }

    /// Insert a new record. Fails on dimension mismatch, a non-finite
    /// component or an existing id; the store is unchanged on failure.
    pub fn insert(&mut self, id: &str, vector: &[f32], metadata: Option<Metadata>) -> Result<()> {
        self.check_vector(vector)?;
        if self.records.contains_key(id) {
            return Err(VectorStoreError::DuplicateId(id.to_string()));
        }
        self.put(VectorRecord::new(id, vector.to_vec(), metadata));
        tracing::debug!("inserted vector '{}'", id);
        Ok(())
    }

    /// Insert or fully replace a record (vector, metadata and norm; no merging).
    pub fn upsert(&mut self, id: &str, vector: &[f32], metadata: Option<Metadata>) -> Result<()> {
        self.check_vector(vector)?;
        let replaced = self
            .put(VectorRecord::new(id, vector.to_vec(), metadata))
            .is_some();
        tracing::debug!("upserted vector '{}' (replaced={})", id, replaced);
        Ok(())
    }

    /// Insert many records, all or nothing. Every record is validated (dimension,
    /// id not already stored, id not repeated within the batch) before any is written.
    pub fn insert_batch(&mut self, records: Vec<VectorRecord>) -> Result<usize> {
        let mut seen = std::collections::HashSet::with_capacity(records.len());
        for r in &records {
            self.check_vector(&r.vector)?;
            if self.records.contains_key(&r.id) || !seen.insert(r.id.as_str()) {
                return Err(VectorStoreError::DuplicateId(r.id.clone()));
            }
        }
        let count = records.len();
        for r in records {
            self.put(r);
        }
        tracing::debug!("inserted batch of {} vectors", count);
        Ok(count)
    }

    /// Upsert many records, all or nothing on an invalid vector.
    /// Later duplicates within the batch win.
    pub fn upsert_batch(&mut self, records: Vec<VectorRecord>) -> Result<usize> {
        for r in &records {
            self.check_vector(&r.vector)?;
        }
        let count = records.len();
        for r in records {
            self.put(r);
        }
        tracing::debug!("upserted batch of {} vectors", count);
        Ok(count)
    }

    pub fn get(&self, id: &str) -> Option<&VectorRecord> {
        self.records.get(id)
    }

    /// Delete a record. Returns `true` if it existed.
    pub fn delete(&mut self, id: &str) -> bool {
        let removed = self.take(id).is_some();
        if removed {
            tracing::debug!("deleted vector '{}'", id);
        }
        removed
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    /// Remove every record. A configured BM25 index is emptied but kept.
    pub fn clear(&mut self) {
        self.records.clear();
        if let Some(ref mut bm25) = self.bm25 {
            bm25.clear();
        }
        tracing::debug!("cleared store");
    }

    /// Ids of all stored records, in no particular order.
    pub fn list_ids(&self) -> Vec<String> {
        self.records.keys().cloned().collect()
    }

    /// Exact k-nearest-neighbor search by linear scan.
    ///
    /// Records failing `filter` or with similarity below `min_similarity` are
    /// skipped. Results are sorted by ascending distance; at most `k` are returned.
    pub fn search(
        &self,
        query: &[f32],
        k: usize,
        filter: Option<&MetadataFilter>,
        min_similarity: Option<f32>,
    ) -> Result<Vec<SearchResult>> {
        self.check_vector(query)?;
        if self.records.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let metric = self.config.metric;
        let query_norm = metric.caches_norm().then(|| vector_norm(query));

        // Max-heap by distance, capped at k: the root is the worst kept candidate.
        let mut heap: BinaryHeap<(OrderedFloat<f32>, &str)> = BinaryHeap::with_capacity(k + 1);
        for record in self.records.values() {
            if let Some(f) = filter {
                if !matches_filter(record.metadata.as_ref(), f) {
                    continue;
                }
            }
            let distance = metric.distance(query, &record.vector, query_norm, record.norm);
            if let Some(min_sim) = min_similarity {
                if metric.similarity(distance) < min_sim {
                    continue;
                }
            }
            heap.push((OrderedFloat(distance), record.id.as_str()));
            if heap.len() > k {
                heap.pop();
            }
        }

        let results: Vec<SearchResult> = heap
            .into_sorted_vec()
            .into_iter()
            .filter_map(|(distance, id)| {
                let record = self.records.get(id)?;
                Some(SearchResult {
                    id: id.to_string(),
                    distance: distance.0,
                    similarity: metric.similarity(distance.0),
                    metadata: record.metadata.clone(),
                })
            })
            .collect();
        tracing::debug!(
            "vector search over {} records returned {} results",
            self.records.len(),
            results.len()
        );
        Ok(results)
    }

    /// Create (or replace) the BM25 index and index every stored record.
    pub fn configure_bm25(&mut self, config: Bm25Config) -> Result<()> {
        let mut index = Bm25Index::new(config)?;
        for record in self.records.values() {
            index.add_document(&record.id, record.metadata.as_ref());
        }
        tracing::info!(
            "configured BM25 index over fields {:?} ({} documents)",
            index.text_fields(),
            index.document_count()
        );
        self.bm25 = Some(index);
        Ok(())
    }

    /// Make sure a BM25 index over exactly `text_fields` exists. Rebuilds only
    /// when the field list differs; existing `k1`/`b`/tokenizer are kept.
    pub fn ensure_bm25(&mut self, text_fields: &[String]) -> Result<()> {
        if text_fields.is_empty() {
            return Err(VectorStoreError::MissingRequiredInput(
                "at least one text field is required for keyword search".to_string(),
            ));
        }
        let base = match self.bm25 {
            Some(ref bm25) if bm25.text_fields() == text_fields => return Ok(()),
            Some(ref bm25) => bm25.config().clone(),
            None => Bm25Config::default(),
        };
        self.configure_bm25(Bm25Config {
            text_fields: text_fields.to_vec(),
            ..base
        })
    }

    /// Drop the BM25 index.
    pub fn disable_bm25(&mut self) {
        if self.bm25.take().is_some() {
            tracing::info!("BM25 index dropped");
        }
    }

    pub fn bm25(&self) -> Option<&Bm25Index> {
        self.bm25.as_ref()
    }

    fn keyword_index(&self) -> Result<&Bm25Index> {
        match self.bm25 {
            Some(ref bm25) if !bm25.text_fields().is_empty() => Ok(bm25),
            _ => Err(VectorStoreError::MissingRequiredInput(
                "keyword search requires a BM25 index with at least one text field".to_string(),
            )),
        }
    }

    /// BM25 candidates, post-filtered, with metadata resolved from the records.
    fn keyword_candidates(
        &self,
        bm25: &Bm25Index,
        query: &str,
        fetch: usize,
        filter: Option<&MetadataFilter>,
    ) -> Vec<KeywordResult> {
        bm25.search(query, fetch)
            .into_iter()
            .filter_map(|(id, score)| {
                let record = self.records.get(&id)?;
                if let Some(f) = filter {
                    if !matches_filter(record.metadata.as_ref(), f) {
                        return None;
                    }
                }
                Some(KeywordResult {
                    metadata: record.metadata.clone(),
                    id,
                    score,
                })
            })
            .collect()
    }

    /// BM25 keyword search, best first.
    ///
    /// Fetches `2k` candidates before applying `filter`, then keeps the top `k`.
    /// Fails with `MissingRequiredInput` when no BM25 index is configured.
    pub fn keyword_search(
        &self,
        query: &str,
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<KeywordResult>> {
        let bm25 = self.keyword_index()?;
        let mut results =
            self.keyword_candidates(bm25, query, k.saturating_mul(KEYWORD_OVERSAMPLE), filter);
        results.truncate(k);
        tracing::debug!("keyword search returned {} results", results.len());
        Ok(results)
    }

    /// Configure BM25 from request fields, or check an existing index is usable.
    fn prepare_keyword(&mut self, text_fields: Option<&[String]>) -> Result<()> {
        match text_fields {
            Some(fields) if !fields.is_empty() => self.ensure_bm25(fields),
            _ => self.keyword_index().map(|_| ()),
        }
    }

    /// The configured index, provided it covers exactly the requested fields.
    fn query_keyword_index(&self, text_fields: Option<&[String]>) -> Result<&Bm25Index> {
        let bm25 = self.keyword_index()?;
        match text_fields {
            Some(fields) if !fields.is_empty() && bm25.text_fields() != fields => {
                Err(VectorStoreError::MissingRequiredInput(format!(
                    "BM25 index covers {:?}, not {:?}; call prepare_search or ensure_bm25 first",
                    bm25.text_fields(),
                    fields
                )))
            }
            _ => Ok(bm25),
        }
    }

    /// Validate a request and bring the BM25 index in line with its `text_fields`.
    ///
    /// This is the only step of a query that mutates the store. Inputs are
    /// checked before any BM25 change, so a rejected request leaves the store
    /// untouched. Vector mode never mutates.
    pub fn prepare_search(&mut self, options: &HybridSearchOptions) -> Result<()> {
        match options.mode {
            SearchMode::Vector => {
                let query = require_vector(options)?;
                self.check_vector(query)
            }
            SearchMode::Keyword => {
                require_text(options)?;
                self.prepare_keyword(options.text_fields.as_deref())
            }
            SearchMode::Hybrid => {
                let query = require_vector(options)?;
                require_text(options)?;
                self.check_vector(query)?;
                self.prepare_keyword(options.text_fields.as_deref())
            }
        }
    }

    /// Read-only vector, keyword and hybrid queries.
    ///
    /// - `vector`: needs `query_vector`; `score` is the similarity.
    /// - `keyword`: needs `query_text` and a configured BM25 index; `score` is
    ///   the BM25 score.
    /// - `hybrid`: needs both; fetches `max(3k, 50)` candidates per side, both
    ///   filtered, and fuses them with RRF or weighted combination.
    ///
    /// Supplied `text_fields` must match the configured index; this method
    /// never builds one. Use [`VectorStore::prepare_search`] (or
    /// [`VectorStore::hybrid_search`]) to configure it first.
    pub fn hybrid_query(&self, options: &HybridSearchOptions) -> Result<Vec<HybridResult>> {
        let k = options.k;
        let filter = options.filter.as_ref();

        match options.mode {
            SearchMode::Vector => {
                let query = require_vector(options)?;
                let results = self.search(query, k, filter, options.min_similarity)?;
                Ok(results
                    .into_iter()
                    .enumerate()
                    .map(|(i, r)| HybridResult {
                        id: r.id,
                        score: r.similarity,
                        vector_similarity: Some(r.similarity),
                        keyword_score: None,
                        vector_rank: Some(i + 1),
                        keyword_rank: None,
                        metadata: r.metadata,
                    })
                    .collect())
            }
            SearchMode::Keyword => {
                let text = require_text(options)?;
                let bm25 = self.query_keyword_index(options.text_fields.as_deref())?;
                let fetch = k.saturating_mul(KEYWORD_OVERSAMPLE);
                let mut results = self.keyword_candidates(bm25, text, fetch, filter);
                results.truncate(k);
                tracing::debug!("keyword query returned {} results", results.len());
                Ok(results
                    .into_iter()
                    .enumerate()
                    .map(|(i, r)| HybridResult {
                        id: r.id,
                        score: r.score,
                        vector_similarity: None,
                        keyword_score: Some(r.score),
                        vector_rank: None,
                        keyword_rank: Some(i + 1),
                        metadata: r.metadata,
                    })
                    .collect())
            }
            SearchMode::Hybrid => {
                let query = require_vector(options)?;
                let text = require_text(options)?;
                self.check_vector(query)?;
                let bm25 = self.query_keyword_index(options.text_fields.as_deref())?;

                let fetch = k
                    .saturating_mul(HYBRID_OVERSAMPLE)
                    .max(HYBRID_MIN_CANDIDATES);
                let vector_results = self.search(query, fetch, filter, options.min_similarity)?;
                let keyword_results = self.keyword_candidates(bm25, text, fetch, filter);

                let fused = match options.fusion {
                    FusionMethod::Rrf => {
                        rrf_fusion(&vector_results, &keyword_results, options.rrf_constant, k)
                    }
                    FusionMethod::Weighted => {
                        weighted_fusion(&vector_results, &keyword_results, options.alpha, k)
                    }
                };
                tracing::debug!(
                    "hybrid search fused {} vector + {} keyword candidates into {} results",
                    vector_results.len(),
                    keyword_results.len(),
                    fused.len()
                );
                Ok(fused)
            }
        }
    }

    /// [`VectorStore::prepare_search`] followed by [`VectorStore::hybrid_query`].
    ///
    /// Supplying `text_fields` creates the BM25 index, or rebuilds it when the
    /// field list differs. Callers holding a shared lock should prepare once
    /// under the write lock and then query under read locks.
    pub fn hybrid_search(&mut self, options: &HybridSearchOptions) -> Result<Vec<HybridResult>> {
        self.prepare_search(options)?;
        self.hybrid_query(options)
    }

    /// Estimates the total memory usage of this store in bytes.
    pub fn estimate_memory_bytes(&self) -> usize {
        let mut total = 0usize;
        for (id, record) in &self.records {
            total += id.len() + 24; // map key
            total += record.estimate_bytes();
        }
        if let Some(ref bm25) = self.bm25 {
            total += bm25.estimate_memory_bytes();
        }
        total
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            dimensions: self.config.dimensions,
            distance_metric: self.config.metric,
            index_kind: self.config.index_kind,
            vector_count: self.records.len(),
            approximate_memory_footprint: self.estimate_memory_bytes(),
            bm25_stats: self.bm25.as_ref().map(Bm25Index::stats),
        }
    }

    /// Structural snapshot of every record and, if configured, the BM25 index.
    /// Records are ordered by id.
    pub fn export(&self) -> StoreSnapshot {
        let mut vectors: Vec<VectorSnapshot> = self
            .records
            .values()
            .map(|r| VectorSnapshot {
                id: r.id.clone(),
                vector: r.vector.clone(),
                metadata: r.metadata.clone(),
                norm: r.norm,
            })
            .collect();
        vectors.sort_by(|a, b| a.id.cmp(&b.id));

        tracing::info!("exported snapshot with {} vectors", vectors.len());
        StoreSnapshot {
            version: SNAPSHOT_VERSION.to_string(),
            dimensions: self.config.dimensions,
            distance: self.config.metric,
            index_kind: self.config.index_kind,
            vectors,
            bm25_index: self.bm25.as_ref().map(Bm25Index::to_snapshot),
        }
    }

    /// Rebuild a store from a snapshot.
    ///
    /// Rejects snapshots with inconsistent dimensions, duplicate ids, or BM25
    /// entries for unknown ids. Records missing from the BM25 snapshot are
    /// re-indexed from their metadata.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Result<Self> {
        snapshot.validate()?;
        let mut store = Self::new(StoreConfig {
            dimensions: snapshot.dimensions,
            metric: snapshot.distance,
            index_kind: snapshot.index_kind,
        })?;

        for v in snapshot.vectors {
            if store.records.contains_key(&v.id) {
                return Err(VectorStoreError::InvalidSnapshot(format!(
                    "duplicate vector id '{}'",
                    v.id
                )));
            }
            store.put(VectorRecord::new(v.id, v.vector, v.metadata));
        }

        if let Some(bm25_snapshot) = snapshot.bm25_index {
            let mut bm25 = Bm25Index::from_snapshot(bm25_snapshot)?;
            if let Some(unknown) = bm25
                .inverted_index()
                .documents
                .keys()
                .find(|id| !store.records.contains_key(id.as_str()))
            {
                return Err(VectorStoreError::InvalidSnapshot(format!(
                    "bm25 index references unknown id '{}'",
                    unknown
                )));
            }
            let missing: Vec<&VectorRecord> = store
                .records
                .values()
                .filter(|r| !bm25.contains(&r.id))
                .collect();
            if !missing.is_empty() {
                tracing::warn!(
                    "{} records missing from the BM25 snapshot; re-indexing them",
                    missing.len()
                );
                for record in missing {
                    bm25.add_document(&record.id, record.metadata.as_ref());
                }
            }
            store.bm25 = Some(bm25);
        }

        tracing::info!(
            "imported snapshot: {} vectors, {} dimensions, metric {}",
            store.records.len(),
            store.config.dimensions,
            store.config.metric
        );
        Ok(store)
    }
}

fn require_vector(options: &HybridSearchOptions) -> Result<&[f32]> {
    options.query_vector.as_deref().ok_or_else(|| {
        VectorStoreError::MissingRequiredInput(format!(
            "{:?} search requires a query vector",
            options.mode
        ))
    })
}

fn require_text(options: &HybridSearchOptions) -> Result<&str> {
    options.text().ok_or_else(|| {
        VectorStoreError::MissingRequiredInput(format!(
            "{:?} search requires query text",
            options.mode
        ))
    })
}
