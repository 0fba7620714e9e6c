//! Error types for the embedding system

/// Result type for embedding operations.
///
/// This is a convenience type alias that uses [`EmbedError`] as the error type.
/// Used throughout the crate for operations that can fail.
pub type Result<T> = std::result::Result<T, EmbedError>;

/// Error type for embedding operations.
///
/// Covers the failure conditions of working with embedding models, from
/// configuration problems to runtime failures during generation. Callers are
/// expected to treat these as first-class outcomes: a store feeding chunks
/// through a provider skips the failing chunk and keeps going, it does not
/// retry here.
#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    /// Error when model configuration is invalid
    #[error("Invalid model configuration: {message}")]
    InvalidConfig { message: String },

    /// Async task join errors
    #[error("Async task failed: {source}")]
    AsyncTask {
        #[from]
        source: tokio::task::JoinError,
    },

    /// Generic errors from other libraries
    #[error("External error: {source}")]
    External {
        #[from]
        source: anyhow::Error,
    },
}

impl EmbedError {
    /// Create an invalid configuration error with a custom message.
    ///
    /// Convenience constructor for configuration validation errors, such as
    /// an unsupported model name or a model that produced embeddings of an
    /// unexpected shape.
    pub fn invalid_config<S: Into<String>>(message: S) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}
