//! prepai-retriever: chunked-document similarity retrieval with durable
//! snapshots.
//!
//! This crate is the core of the prepai retrieval stack. It takes raw
//! document text, splits it into fixed-size chunks, embeds each chunk
//! through an injected provider, keeps the embeddings in an exact
//! nearest-neighbor index aligned 1:1 with the chunk texts, and persists
//! the whole store as an atomic on-disk snapshot after every mutation.
//!
//! ## Key Modules
//!
//! - **[`retrieval`]**: the vector index, document store, and the
//!   [`RetrievalEngine`](retrieval::engine::RetrievalEngine) orchestrating
//!   them, which is the only type the surrounding application calls.
//! - **[`storage`]**: the versioned snapshot format and its
//!   write-temp-then-promote persistence.
//! - **[`config`]** / **[`error`]**: engine configuration and the error
//!   taxonomy.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use prepai_embed::{EmbedConfig, FastEmbedProvider};
//! use prepai_retriever::{RetrievalEngine, RetrieverConfig};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let provider = Arc::new(FastEmbedProvider::create(EmbedConfig::minilm_l6()).await?);
//! let engine = RetrievalEngine::new(RetrieverConfig::default(), provider).await?;
//!
//! engine.add_document("Tell me about a time you handled conflict.").await?;
//! let context = engine.search("conflict resolution", 3).await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Document → TextSplitter → EmbeddingProvider → VectorIndex
//!                                                    │ 1:1 by position
//!                                              DocumentStore
//!                                                    │
//!                                              SnapshotStore (vectors.bin + documents.json)
//! ```

pub mod config;
pub mod error;
pub mod retrieval;
pub mod storage;

// Re-export the main types for easy access
pub use config::RetrieverConfig;
pub use error::{Result, RetrievalError};
pub use retrieval::engine::RetrievalEngine;
