//! Error types for the retrieval store.
//!
//! The failure policy of the store is deliberately asymmetric. Per-chunk
//! embedding failures are absorbed where they happen (the chunk is skipped
//! and processing continues), so they never appear here. What does appear
//! here is fatal: a vector of the wrong dimension, or a snapshot that cannot
//! be durably written or faithfully read. Those propagate to the caller
//! verbatim rather than being retried or discarded.

/// Result type for retrieval store operations.
pub type Result<T> = std::result::Result<T, RetrievalError>;

/// Error type for the retrieval store and its persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    /// A vector's length disagrees with the store's fixed dimension.
    ///
    /// Raised when appending a wrong-length embedding, when a snapshot was
    /// written with a different dimension than the store is configured for,
    /// or when an injected provider produces a different dimension than the
    /// configuration promises. Continuing past this would corrupt every
    /// later append, so it is fatal.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// I/O failure while saving or loading a snapshot.
    #[error("snapshot I/O failed: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// The document list could not be encoded or decoded.
    #[error("snapshot document list is unreadable: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },

    /// A snapshot exists on disk but is not a consistent pair of artifacts.
    #[error("corrupt snapshot: {message}")]
    Corrupt { message: String },

    /// A configuration file could not be parsed.
    #[error("invalid configuration: {source}")]
    Config {
        #[from]
        source: toml::de::Error,
    },
}

impl RetrievalError {
    /// Create a corrupt-snapshot error with a custom message.
    pub fn corrupt<S: Into<String>>(message: S) -> Self {
        Self::Corrupt {
            message: message.into(),
        }
    }
}
