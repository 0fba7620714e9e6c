//! Configuration for embedding models

use serde::{Deserialize, Serialize};

/// Name of the default sentence-embedding model.
///
/// `all-MiniLM-L6-v2` produces 384-dimension vectors and ships as a built-in
/// fastembed model, so it needs no external model files.
pub const DEFAULT_MODEL_NAME: &str = "all-MiniLM-L6-v2";

/// Configuration for embedding models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedConfig {
    /// Name of the embedding model to use
    pub model_name: String,
    /// Maximum batch size for embedding generation
    pub batch_size: usize,
    /// Whether to L2-normalize embeddings
    pub normalize: bool,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self::minilm_l6()
    }
}

impl EmbedConfig {
    /// Create a configuration for the named model with default settings.
    pub fn new<S: Into<String>>(model_name: S) -> Self {
        Self {
            model_name: model_name.into(),
            batch_size: 16,
            normalize: true,
        }
    }

    /// Configuration for the `all-MiniLM-L6-v2` sentence embedding model.
    pub fn minilm_l6() -> Self {
        Self::new(DEFAULT_MODEL_NAME)
    }

    /// Set the maximum batch size for `embed_texts`.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Enable or disable L2 normalization of generated embeddings.
    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    /// Name of the configured model.
    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_minilm() {
        let config = EmbedConfig::default();
        assert_eq!(config.model_name(), "all-MiniLM-L6-v2");
        assert!(config.normalize);
        assert_eq!(config.batch_size, 16);
    }

    #[test]
    fn test_builder_methods() {
        let config = EmbedConfig::minilm_l6()
            .with_batch_size(4)
            .with_normalize(false);
        assert_eq!(config.batch_size, 4);
        assert!(!config.normalize);
    }
}
