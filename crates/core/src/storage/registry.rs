//! Named stores shared across threads.

use crate::config::StoreConfig;
use crate::error::{Result, VectorStoreError};
use crate::storage::snapshot::StoreSnapshot;
use crate::storage::store::VectorStore;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// A store behind its own lock. Readers (searches) share it, writers are exclusive.
pub type SharedStore = Arc<RwLock<VectorStore>>;

/// Registry of independently locked stores keyed by name.
///
/// The registry lock only guards the name map; operations on one store never
/// block operations on another.
#[derive(Debug, Clone, Default)]
pub struct StoreRegistry {
    stores: Arc<RwLock<HashMap<String, SharedStore>>>,
}

impl StoreRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new store. Returns `StoreExists` if the name is taken.
    pub fn create(&self, name: &str, config: StoreConfig) -> Result<SharedStore> {
        let mut stores = self.stores.write();
        if stores.contains_key(name) {
            return Err(VectorStoreError::StoreExists(name.to_string()));
        }
        let store = Arc::new(RwLock::new(VectorStore::new(config)?));
        stores.insert(name.to_string(), Arc::clone(&store));
        tracing::info!(
            "created store '{}' ({} dimensions, metric {})",
            name,
            config.dimensions,
            config.metric
        );
        Ok(store)
    }

    /// Returns a handle to the named store.
    pub fn get(&self, name: &str) -> Result<SharedStore> {
        self.stores
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| VectorStoreError::NotFound(format!("store '{}'", name)))
    }

    /// Deletes a store by name. Returns `true` if it existed.
    /// Outstanding handles stay usable but are detached from the registry.
    pub fn delete(&self, name: &str) -> bool {
        let removed = self.stores.write().remove(name).is_some();
        if removed {
            tracing::info!("deleted store '{}'", name);
        }
        removed
    }

    pub fn contains(&self, name: &str) -> bool {
        self.stores.read().contains_key(name)
    }

    /// Returns the names of all stores, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.stores.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Build a store from a snapshot and register it under `name`, replacing
    /// any existing store with that name. The registry is untouched if the
    /// snapshot is invalid.
    pub fn import(&self, name: &str, snapshot: StoreSnapshot) -> Result<SharedStore> {
        let store = Arc::new(RwLock::new(VectorStore::from_snapshot(snapshot)?));
        let replaced = self
            .stores
            .write()
            .insert(name.to_string(), Arc::clone(&store))
            .is_some();
        tracing::info!("imported store '{}' (replaced={})", name, replaced);
        Ok(store)
    }

    /// Snapshot the named store under a read lock.
    pub fn export(&self, name: &str) -> Result<StoreSnapshot> {
        let store = self.get(name)?;
        let snapshot = store.read().export();
        Ok(snapshot)
    }

    /// Remove every store.
    pub fn clear(&self) {
        self.stores.write().clear();
    }

    /// Returns the estimated total memory usage across all stores.
    pub fn total_memory_bytes(&self) -> usize {
        self.stores
            .read()
            .values()
            .map(|s| s.read().estimate_memory_bytes())
            .sum()
    }
}
