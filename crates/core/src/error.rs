//! Error types for store, index and registry operations.
//!
//! Every failure is synchronous and local. Filters never fail: malformed
//! filters degrade to non-matching conditions instead.

use thiserror::Error;

/// Errors surfaced by vecstore operations.
#[derive(Error, Debug)]
pub enum VectorStoreError {
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("vector component {index} is not a finite number")]
    NonFiniteVector { index: usize },

    #[error("vector with id '{0}' already exists")]
    DuplicateId(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("missing required input: {0}")]
    MissingRequiredInput(String),

    #[error("store '{0}' already exists")]
    StoreExists(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, VectorStoreError>;
