//! Embedding provider implementations

use crate::config::EmbedConfig;
use crate::error::{EmbedError, Result};
use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

/// Result of embedding generation
#[derive(Debug, Clone)]
pub struct EmbeddingResult {
    /// The generated embeddings, one per input text
    pub embeddings: Vec<Vec<f32>>,
    /// The dimension of each embedding vector
    pub dimension: usize,
}

impl EmbeddingResult {
    /// Create a new embedding result from a vector of embeddings.
    ///
    /// The dimension is inferred from the first embedding vector. If the
    /// embeddings vector is empty, dimension defaults to 0.
    pub fn new(embeddings: Vec<Vec<f32>>) -> Self {
        let dimension = embeddings.first().map(|e| e.len()).unwrap_or(0);
        Self {
            embeddings,
            dimension,
        }
    }

    /// Returns the number of embedding vectors in this result.
    pub fn len(&self) -> usize {
        self.embeddings.len()
    }

    /// Returns `true` if this result contains no embedding vectors.
    pub fn is_empty(&self) -> bool {
        self.embeddings.is_empty()
    }
}

/// Type alias for cached model entries (model, dimension)
type ModelCacheEntry = (Arc<Mutex<TextEmbedding>>, usize);

/// Global cache for initialized embedding models to avoid reloading
static MODEL_CACHE: OnceLock<Mutex<HashMap<String, ModelCacheEntry>>> = OnceLock::new();

/// Get the global model cache
fn get_model_cache() -> &'static Mutex<HashMap<String, ModelCacheEntry>> {
    MODEL_CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Trait for embedding providers that can generate embeddings from text.
///
/// Implementations map a text span to a fixed-dimension vector or signal
/// failure via [`EmbedError`]. Callers own the failure policy; providers do
/// not retry internally.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding for a single text
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts (batch processing)
    async fn embed_texts(&self, texts: &[String]) -> Result<EmbeddingResult>;

    /// Get the dimension of embeddings produced by this provider
    fn embedding_dimension(&self) -> usize;

    /// Get the name/identifier of this provider
    fn provider_name(&self) -> &str;
}

/// FastEmbed-based embedding provider using local ONNX models
#[derive(Clone)]
pub struct FastEmbedProvider {
    config: EmbedConfig,
    model: Option<Arc<Mutex<TextEmbedding>>>,
    dimension: usize,
}

impl std::fmt::Debug for FastEmbedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbedProvider")
            .field("config", &self.config)
            .field("model", &self.model.is_some())
            .field("dimension", &self.dimension)
            .finish()
    }
}

/// Resolve a configured model name to a built-in fastembed model.
fn builtin_model(name: &str) -> Result<EmbeddingModel> {
    match name {
        "all-MiniLM-L6-v2" => Ok(EmbeddingModel::AllMiniLML6V2),
        other => Err(EmbedError::invalid_config(format!(
            "unsupported embedding model: {other}"
        ))),
    }
}

impl FastEmbedProvider {
    /// Creates a new uninitialized provider. Call [`initialize`](Self::initialize)
    /// (or use [`create`](Self::create)) before generating embeddings.
    pub fn new(config: EmbedConfig) -> Self {
        Self {
            config,
            model: None,
            dimension: 384, // Default dimension for all-MiniLM-L6-v2
        }
    }

    /// Loads the embedding model, reusing a process-wide cached instance when
    /// the same model was already initialized.
    pub async fn initialize(&mut self) -> Result<()> {
        tracing::info!(
            "Initializing FastEmbed provider for model: {}",
            self.config.model_name()
        );

        let cache_key = self.config.model_name().to_string();

        // Check if the model is already cached
        let cached_data = {
            let cache = get_model_cache().lock().unwrap();
            cache
                .get(&cache_key)
                .map(|(model, dim)| (Arc::clone(model), *dim))
        };

        if let Some((cached_model, cached_dimension)) = cached_data {
            tracing::info!("Using cached model for: {}", self.config.model_name());
            self.model = Some(cached_model);
            self.dimension = cached_dimension;
            return self.validate_model().await;
        }

        let model_kind = builtin_model(self.config.model_name())?;

        // Load the model in a blocking task
        let model_name = self.config.model_name().to_string();
        let (model, dimension) =
            tokio::task::spawn_blocking(move || -> Result<(TextEmbedding, usize)> {
                tracing::info!("Loading embedding model: {model_name}");

                let init_options =
                    InitOptions::new(model_kind).with_show_download_progress(true);

                let mut model = TextEmbedding::try_new(init_options)
                    .map_err(|e| EmbedError::External { source: e })?;

                // Get dimension by generating a test embedding
                let test_embeddings = model
                    .embed(vec!["test".to_string()], None)
                    .map_err(|e| EmbedError::External { source: e })?;
                let dimension = test_embeddings.first().map(|emb| emb.len()).unwrap_or(384);

                tracing::info!("Model loaded successfully. Dimension: {dimension}");
                Ok((model, dimension))
            })
            .await??;

        let model_arc = Arc::new(Mutex::new(model));

        // Cache the model
        {
            let mut cache = get_model_cache().lock().unwrap();
            cache.insert(cache_key, (Arc::clone(&model_arc), dimension));
        }

        self.model = Some(model_arc);
        self.dimension = dimension;

        // Validate the model works correctly
        self.validate_model().await
    }

    /// Creates and initializes a provider in one step.
    pub async fn create(config: EmbedConfig) -> Result<Self> {
        let mut provider = Self::new(config);
        provider.initialize().await?;
        Ok(provider)
    }

    /// Validate that the model is working correctly
    async fn validate_model(&self) -> Result<()> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| EmbedError::invalid_config("Model not initialized"))?;

        // Test the model with a simple embedding
        let test_text = "validation test";
        let model_clone = Arc::clone(model);

        let validation_result = tokio::task::spawn_blocking(move || -> Result<Vec<Vec<f32>>> {
            let mut model_guard = model_clone.lock().unwrap();
            model_guard
                .embed(vec![test_text.to_string()], None)
                .map_err(|e| EmbedError::External { source: e })
        })
        .await??;

        let embedding = validation_result
            .first()
            .filter(|e| !e.is_empty())
            .ok_or_else(|| {
                EmbedError::invalid_config("Model validation failed: empty embedding")
            })?;

        if embedding.len() != self.dimension {
            return Err(EmbedError::invalid_config(format!(
                "Model validation failed: expected dimension {}, got {}",
                self.dimension,
                embedding.len()
            )));
        }

        if embedding.iter().any(|value| !value.is_finite()) {
            return Err(EmbedError::invalid_config(
                "Model validation failed: non-finite values in embedding",
            ));
        }

        tracing::debug!("Model validation passed for: {}", self.config.model_name());
        Ok(())
    }

    /// Clears the process-wide model cache.
    pub fn clear_cache() {
        let cache = get_model_cache();
        let mut cache_guard = cache.lock().unwrap();
        cache_guard.clear();
        tracing::info!("Model cache cleared");
    }

    /// Returns the number of cached models.
    pub fn cache_size() -> usize {
        let cache = get_model_cache();
        let cache_guard = cache.lock().unwrap();
        cache_guard.len()
    }

    /// L2-normalize embeddings in place when the configuration asks for it.
    fn normalize(&self, embeddings: &mut [Vec<f32>]) {
        if !self.config.normalize {
            return;
        }
        for embedding in embeddings {
            let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm > 0.0 {
                for value in embedding.iter_mut() {
                    *value /= norm;
                }
            }
        }
    }
}

#[async_trait]
impl EmbeddingProvider for FastEmbedProvider {
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let texts = vec![text.to_string()];
        let result = self.embed_texts(&texts).await?;
        result
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| EmbedError::invalid_config("No embedding generated for text"))
    }

    async fn embed_texts(&self, texts: &[String]) -> Result<EmbeddingResult> {
        if texts.is_empty() {
            return Ok(EmbeddingResult::new(vec![]));
        }

        let model = self.model.as_ref().ok_or_else(|| {
            EmbedError::invalid_config("Model not initialized. Call initialize() first.")
        })?;

        tracing::debug!("Generating embeddings for {} texts", texts.len());

        // Process in batches to avoid memory issues
        let mut all_embeddings = Vec::new();

        for chunk in texts.chunks(self.config.batch_size.max(1)) {
            let chunk = chunk.to_vec();
            let model_clone = Arc::clone(model);

            let mut batch_embeddings =
                tokio::task::spawn_blocking(move || -> Result<Vec<Vec<f32>>> {
                    tracing::debug!("Processing batch of {} texts", chunk.len());

                    let mut model_guard = model_clone.lock().unwrap();
                    model_guard
                        .embed(chunk, None)
                        .map_err(|e| EmbedError::External { source: e })
                })
                .await??;

            self.normalize(&mut batch_embeddings);
            all_embeddings.extend(batch_embeddings);
        }

        tracing::debug!("Generated {} embeddings", all_embeddings.len());
        Ok(EmbeddingResult::new(all_embeddings))
    }

    fn embedding_dimension(&self) -> usize {
        self.dimension
    }

    fn provider_name(&self) -> &str {
        "fastembed"
    }
}
