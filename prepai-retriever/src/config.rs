//! Configuration for the retrieval store.

use crate::error::Result;
use prepai_context::DEFAULT_CHUNK_SIZE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Embedding dimension of the reference deployment (`all-MiniLM-L6-v2`).
pub const DEFAULT_DIMENSION: usize = 384;

/// Default number of results returned by a search.
pub const DEFAULT_RESULTS: usize = 3;

/// Configuration for a [`RetrievalEngine`](crate::retrieval::engine::RetrievalEngine).
///
/// The dimension is fixed for the lifetime of a store: it must match the
/// injected embedding provider and any snapshot already on disk. All fields
/// have defaults matching the reference deployment, so a TOML file only
/// needs to name what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrieverConfig {
    /// Directory holding the on-disk snapshot pair.
    pub storage_dir: PathBuf,
    /// Embedding dimension of the store.
    pub dimension: usize,
    /// Default chunk size, in characters, for added documents.
    pub chunk_size: usize,
    /// Default number of results returned by a search.
    pub default_results: usize,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from("vector_store"),
            dimension: DEFAULT_DIMENSION,
            chunk_size: DEFAULT_CHUNK_SIZE,
            default_results: DEFAULT_RESULTS,
        }
    }
}

impl RetrieverConfig {
    /// Create a configuration storing snapshots under `storage_dir`.
    pub fn new<P: Into<PathBuf>>(storage_dir: P) -> Self {
        Self {
            storage_dir: storage_dir.into(),
            ..Self::default()
        }
    }

    /// Set the embedding dimension of the store.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    /// Set the default chunk size for added documents.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set the default number of search results.
    pub fn with_default_results(mut self, default_results: usize) -> Self {
        self.default_results = default_results;
        self
    }

    /// Load a configuration from a TOML file.
    ///
    /// Missing fields fall back to their defaults; an unreadable file or
    /// malformed TOML is an error.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }
}
