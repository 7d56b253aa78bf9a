//! Storage layer: the vector store, snapshots, disk persistence and the
//! named-store registry.
//!
//! Data lives in-memory in [`VectorStore`] values. Durability is provided by
//! JSON snapshots with a CRC32 footer (atomic temp-file + rename).

/// Disk persistence: snapshot encode/decode and atomic save/load.
pub mod persistence;
/// Named stores behind per-store locks.
pub mod registry;
/// Versioned snapshot types.
pub mod snapshot;
/// The vector store and hybrid search orchestration.
pub mod store;

pub use persistence::{decode_snapshot, encode_snapshot, load_store, save_store};
pub use registry::{SharedStore, StoreRegistry};
pub use snapshot::{Bm25DocumentSnapshot, Bm25Snapshot, StoreSnapshot, VectorSnapshot};
pub use store::{StoreStats, VectorStore};
