//! High-level retrieval engine that orchestrates chunking, embedding,
//! indexing, and persistence.
//!
//! This is the only component the surrounding application talks to. It owns
//! the (vector index, document store) pair, keeps the two position-aligned,
//! and persists a full snapshot after every mutation.
//!
//! ## Pipeline Flow
//!
//! ```text
//! add_document: text → TextSplitter → EmbeddingProvider (per chunk)
//!                        → VectorIndex.append + DocumentStore.append
//!                        → SnapshotStore.save (once, batched)
//!
//! search:       query → EmbeddingProvider → VectorIndex.knn
//!                        → DocumentStore lookup by position → texts
//! ```
//!
//! ## Failure policy
//!
//! Per-chunk embedding failures are absorbed: the chunk is skipped with a
//! warning and the rest of the document proceeds. Dimension mismatches and
//! persistence failures are fatal and propagate. `search` never fails;
//! an empty or unreachable result maps to an empty vector.
//!
//! ## Concurrency
//!
//! Interior state lives behind a `tokio::sync::RwLock`. Mutations hold the
//! write lock across the whole mutate-then-persist sequence, so a reader
//! never observes the index and document list out of alignment and two
//! writers never interleave appends. Searches share the read lock.
//! Embedding runs before any lock is taken; it mutates nothing.

use std::sync::Arc;

use prepai_context::TextSplitter;
use prepai_embed::EmbeddingProvider;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::config::RetrieverConfig;
use crate::error::{Result, RetrievalError};
use crate::retrieval::document_store::DocumentStore;
use crate::retrieval::vector_index::VectorIndex;
use crate::storage::snapshot_store::SnapshotStore;

/// The retrieval store: chunked documents, their embeddings, and queries
/// over them.
///
/// Constructed once with an injected embedding provider and a configured
/// storage directory, then shared by handle wherever the application needs
/// it. There is no global instance.
pub struct RetrievalEngine {
    config: RetrieverConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    snapshot_store: SnapshotStore,
    state: RwLock<StoreState>,
}

#[derive(Debug)]
struct StoreState {
    index: VectorIndex,
    documents: DocumentStore,
}

impl std::fmt::Debug for RetrievalEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalEngine")
            .field("config", &self.config)
            .field("provider", &self.embedding_provider.provider_name())
            .finish()
    }
}

impl RetrievalEngine {
    /// Creates an engine, reconstructing prior state from the snapshot on
    /// disk if one exists.
    ///
    /// The provider's dimension must equal the configured dimension; a
    /// disagreement is a configuration error caught here rather than on the
    /// first append. A malformed or mismatched snapshot is also fatal and is
    /// never silently replaced with an empty store.
    pub async fn new(
        config: RetrieverConfig,
        embedding_provider: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        let provider_dimension = embedding_provider.embedding_dimension();
        if provider_dimension != config.dimension {
            return Err(RetrievalError::DimensionMismatch {
                expected: config.dimension,
                actual: provider_dimension,
            });
        }

        let snapshot_store = SnapshotStore::new(&config.storage_dir);
        let state = match snapshot_store.load(config.dimension).await? {
            Some((index, documents)) => {
                info!(
                    chunks = index.count(),
                    dir = %config.storage_dir.display(),
                    "Restored retrieval store from snapshot"
                );
                StoreState { index, documents }
            }
            None => {
                info!(
                    dir = %config.storage_dir.display(),
                    "No snapshot found, starting with an empty store"
                );
                StoreState {
                    index: VectorIndex::new(config.dimension),
                    documents: DocumentStore::new(),
                }
            }
        };

        Ok(Self {
            config,
            embedding_provider,
            snapshot_store,
            state: RwLock::new(state),
        })
    }

    /// Chunks `text` with the configured chunk size, embeds each chunk, and
    /// stores the results. See [`add_document_with_chunk_size`](Self::add_document_with_chunk_size).
    pub async fn add_document(&self, text: &str) -> Result<usize> {
        self.add_document_with_chunk_size(text, self.config.chunk_size)
            .await
    }

    /// Chunks `text` into `chunk_size`-character pieces, embeds each chunk,
    /// and appends the surviving (embedding, text) pairs to the store.
    ///
    /// A chunk whose embedding fails is skipped with a warning; the rest of
    /// the document is still processed. If at least one chunk survives, the
    /// full snapshot is persisted once at the end of the call. Returns the
    /// number of chunks stored; empty input stores nothing.
    pub async fn add_document_with_chunk_size(
        &self,
        text: &str,
        chunk_size: usize,
    ) -> Result<usize> {
        let splitter = TextSplitter::new(chunk_size);
        let chunks = splitter.split(text);
        if chunks.is_empty() {
            return Ok(0);
        }
        let total = chunks.len();

        // Embed outside the lock; only the append+persist sequence needs
        // exclusivity.
        let mut embedded: Vec<(String, Vec<f32>)> = Vec::with_capacity(total);
        for chunk in chunks {
            match self.embedding_provider.embed_text(&chunk.text).await {
                Ok(vector) => embedded.push((chunk.text, vector)),
                Err(err) => {
                    warn!(
                        sequence = chunk.sequence,
                        "Skipping chunk, embedding failed: {err}"
                    );
                }
            }
        }
        if embedded.is_empty() {
            warn!("No chunk of the document could be embedded, store unchanged");
            return Ok(0);
        }

        let mut state = self.state.write().await;
        for (chunk_text, vector) in &embedded {
            // Lock-step: the text is appended only once its vector is in, so
            // the pair can never drift out of alignment.
            state.index.append(vector)?;
            state.documents.append(chunk_text.clone());
        }
        self.snapshot_store
            .save(&state.index, &state.documents)
            .await?;

        info!(
            stored = embedded.len(),
            skipped = total - embedded.len(),
            total_chunks = state.index.count(),
            "Added document to retrieval store"
        );
        Ok(embedded.len())
    }

    /// Returns the texts of the `k` stored chunks nearest to `query`, in
    /// ascending distance order.
    ///
    /// Never fails: an empty store short-circuits without invoking the
    /// embedder, and a query that cannot be embedded (or yields an unusable
    /// vector) is logged and treated as "no usable signal", returning an
    /// empty result.
    pub async fn search(&self, query: &str, k: usize) -> Vec<String> {
        {
            let state = self.state.read().await;
            if state.index.count() == 0 {
                return Vec::new();
            }
        }

        let query_vector = match self.embedding_provider.embed_text(query).await {
            Ok(vector) => vector,
            Err(err) => {
                warn!("Search query could not be embedded: {err}");
                return Vec::new();
            }
        };

        let state = self.state.read().await;
        let hits = match state.index.knn(&query_vector, k) {
            Ok(hits) => hits,
            Err(err) => {
                warn!("Search query vector was unusable: {err}");
                return Vec::new();
            }
        };

        hits.into_iter()
            .map(|(position, _distance)| state.documents.get(position).to_string())
            .collect()
    }

    /// Resets the store to empty and persists the empty snapshot.
    /// Idempotent.
    pub async fn clear(&self) -> Result<()> {
        let mut state = self.state.write().await;
        state.index = VectorIndex::new(self.config.dimension);
        state.documents = DocumentStore::new();
        self.snapshot_store
            .save(&state.index, &state.documents)
            .await?;

        info!("Cleared retrieval store");
        Ok(())
    }

    /// The number of chunks currently stored.
    pub async fn count(&self) -> usize {
        self.state.read().await.index.count()
    }

    /// The fixed embedding dimension of the store.
    pub fn dimension(&self) -> usize {
        self.config.dimension
    }

    /// The engine's configuration.
    pub fn config(&self) -> &RetrieverConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use prepai_embed::{EmbedError, EmbeddingResult};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    const DIM: usize = 8;

    /// Deterministic embedder for tests: a byte histogram smeared across the
    /// dimensions, so identical text always embeds identically and different
    /// text almost never collides. Can inject a failure for one exact text
    /// and counts every call.
    struct StubProvider {
        dimension: usize,
        fail_on: Option<String>,
        calls: AtomicUsize,
    }

    impl StubProvider {
        fn new() -> Self {
            Self {
                dimension: DIM,
                fail_on: None,
                calls: AtomicUsize::new(0),
            }
        }

        fn failing_on(text: &str) -> Self {
            Self {
                fail_on: Some(text.to_string()),
                ..Self::new()
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn vector_for(&self, text: &str) -> Vec<f32> {
            let mut vector = vec![0.0f32; self.dimension];
            for (i, byte) in text.bytes().enumerate() {
                vector[(byte as usize + i) % self.dimension] += 1.0;
            }
            vector
        }
    }

    #[async_trait]
    impl EmbeddingProvider for StubProvider {
        async fn embed_text(&self, text: &str) -> prepai_embed::Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_on.as_deref() == Some(text) {
                return Err(EmbedError::invalid_config("injected embedding failure"));
            }
            Ok(self.vector_for(text))
        }

        async fn embed_texts(&self, texts: &[String]) -> prepai_embed::Result<EmbeddingResult> {
            let mut embeddings = Vec::with_capacity(texts.len());
            for text in texts {
                embeddings.push(self.embed_text(text).await?);
            }
            Ok(EmbeddingResult::new(embeddings))
        }

        fn embedding_dimension(&self) -> usize {
            self.dimension
        }

        fn provider_name(&self) -> &str {
            "stub"
        }
    }

    fn test_config(dir: &std::path::Path) -> RetrieverConfig {
        RetrieverConfig::new(dir.join("store"))
            .with_dimension(DIM)
            .with_chunk_size(4)
    }

    async fn test_engine(dir: &std::path::Path) -> (RetrievalEngine, Arc<StubProvider>) {
        let provider = Arc::new(StubProvider::new());
        let engine = RetrievalEngine::new(test_config(dir), provider.clone())
            .await
            .unwrap();
        (engine, provider)
    }

    async fn assert_aligned(engine: &RetrievalEngine) {
        let state = engine.state.read().await;
        assert_eq!(state.index.count(), state.documents.count());
    }

    #[tokio::test]
    async fn test_add_document_chunks_and_stores() {
        let dir = tempdir().unwrap();
        let (engine, _) = test_engine(dir.path()).await;

        let stored = engine.add_document("ABCDEFGHIJ").await.unwrap();
        assert_eq!(stored, 3); // "ABCD", "EFGH", "IJ"
        assert_eq!(engine.count().await, 3);
        assert_aligned(&engine).await;
    }

    #[tokio::test]
    async fn test_self_retrieval_of_exact_chunk() {
        let dir = tempdir().unwrap();
        let (engine, _) = test_engine(dir.path()).await;

        engine.add_document("ABCDEFGHIJ").await.unwrap();
        let results = engine.search("ABCD", 1).await;
        assert_eq!(results, ["ABCD"]);
    }

    #[tokio::test]
    async fn test_search_results_in_ascending_distance_order() {
        let dir = tempdir().unwrap();
        let (engine, _) = test_engine(dir.path()).await;

        engine.add_document("ABCDEFGHIJKL").await.unwrap();
        let results = engine.search("EFGH", 3).await;
        assert_eq!(results.len(), 3);
        assert_eq!(results[0], "EFGH"); // exact match has distance 0
    }

    #[tokio::test]
    async fn test_empty_store_search_skips_embedder() {
        let dir = tempdir().unwrap();
        let (engine, provider) = test_engine(dir.path()).await;

        let results = engine.search("anything", 3).await;
        assert!(results.is_empty());
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_search_saturates_at_store_size() {
        let dir = tempdir().unwrap();
        let (engine, _) = test_engine(dir.path()).await;

        engine.add_document("ABCDEFGHIJ").await.unwrap();
        let results = engine.search("ABCD", 10).await;
        assert_eq!(results.len(), 3);
    }

    #[tokio::test]
    async fn test_partial_embedding_failure_skips_only_that_chunk() {
        let dir = tempdir().unwrap();
        let provider = Arc::new(StubProvider::failing_on("EFGH"));
        let engine = RetrievalEngine::new(test_config(dir.path()), provider)
            .await
            .unwrap();

        let stored = engine.add_document("ABCDEFGHIJ").await.unwrap();
        assert_eq!(stored, 2);
        assert_eq!(engine.count().await, 2);
        assert_aligned(&engine).await;

        // The failed chunk is not retrievable; the others are.
        let results = engine.search("ABCD", 1).await;
        assert_eq!(results, ["ABCD"]);
    }

    #[tokio::test]
    async fn test_fully_failed_document_leaves_store_unchanged() {
        let dir = tempdir().unwrap();
        let provider = Arc::new(StubProvider::failing_on("ABCD"));
        let engine = RetrievalEngine::new(test_config(dir.path()), provider)
            .await
            .unwrap();

        let stored = engine.add_document("ABCD").await.unwrap();
        assert_eq!(stored, 0);
        assert_eq!(engine.count().await, 0);
        // Nothing was persisted either: a fresh engine also starts empty.
        let (engine2, _) = test_engine(dir.path()).await;
        assert_eq!(engine2.count().await, 0);
    }

    #[tokio::test]
    async fn test_query_embedding_failure_returns_empty() {
        let dir = tempdir().unwrap();
        let provider = Arc::new(StubProvider::failing_on("bad query"));
        let engine = RetrievalEngine::new(test_config(dir.path()), provider)
            .await
            .unwrap();

        engine.add_document("ABCDEFGH").await.unwrap();
        let results = engine.search("bad query", 3).await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_clear_resets_and_is_idempotent() {
        let dir = tempdir().unwrap();
        let (engine, _) = test_engine(dir.path()).await;

        engine.add_document("ABCDEFGHIJ").await.unwrap();
        assert_eq!(engine.count().await, 3);

        engine.clear().await.unwrap();
        assert_eq!(engine.count().await, 0);
        assert!(engine.search("ABCD", 3).await.is_empty());

        engine.clear().await.unwrap();
        assert_eq!(engine.count().await, 0);
        assert_aligned(&engine).await;
    }

    #[tokio::test]
    async fn test_state_survives_engine_restart() {
        let dir = tempdir().unwrap();
        {
            let (engine, _) = test_engine(dir.path()).await;
            engine.add_document("ABCDEFGHIJ").await.unwrap();
        }

        let (engine, _) = test_engine(dir.path()).await;
        assert_eq!(engine.count().await, 3);
        assert_eq!(engine.search("ABCD", 1).await, ["ABCD"]);
    }

    #[tokio::test]
    async fn test_cleared_state_survives_engine_restart() {
        let dir = tempdir().unwrap();
        {
            let (engine, _) = test_engine(dir.path()).await;
            engine.add_document("ABCDEFGHIJ").await.unwrap();
            engine.clear().await.unwrap();
        }

        let (engine, _) = test_engine(dir.path()).await;
        assert_eq!(engine.count().await, 0);
    }

    #[tokio::test]
    async fn test_provider_dimension_disagreement_is_fatal() {
        let dir = tempdir().unwrap();
        let provider = Arc::new(StubProvider::new());
        let config = test_config(dir.path()).with_dimension(DIM + 1);

        let err = RetrievalEngine::new(config, provider).await.unwrap_err();
        assert!(matches!(err, RetrievalError::DimensionMismatch { .. }));
    }

    #[tokio::test]
    async fn test_empty_document_stores_nothing() {
        let dir = tempdir().unwrap();
        let (engine, provider) = test_engine(dir.path()).await;

        let stored = engine.add_document("").await.unwrap();
        assert_eq!(stored, 0);
        assert_eq!(engine.count().await, 0);
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_alignment_holds_across_mixed_operations() {
        let dir = tempdir().unwrap();
        let (engine, _) = test_engine(dir.path()).await;

        engine.add_document("ABCDEFGHIJ").await.unwrap();
        engine.add_document("KLMNOP").await.unwrap();
        assert_aligned(&engine).await;

        engine.clear().await.unwrap();
        assert_aligned(&engine).await;

        engine.add_document("QRSTUVWX").await.unwrap();
        assert_aligned(&engine).await;
        assert_eq!(engine.count().await, 2);
    }
}
