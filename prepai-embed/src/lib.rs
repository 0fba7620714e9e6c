//! # prepai-embed
//!
//! Text embedding generation for the prepai retrieval stack, with local ONNX
//! models via FastEmbed. The crate defines the provider boundary the
//! retrieval core depends on and ships one concrete implementation.
//!
//! ## Design
//!
//! - **[`EmbeddingProvider`]**: the async trait the retrieval engine is
//!   injected with. Anything that maps text to a fixed-dimension `Vec<f32>`
//!   (or fails with [`EmbedError`]) can stand in; the core never assumes a
//!   particular backend.
//! - **[`FastEmbedProvider`]**: runs `all-MiniLM-L6-v2` (384 dimensions)
//!   locally, without external API calls. Initialized models are cached
//!   process-wide so repeated construction is cheap.
//! - **Failure is an expected outcome**: providers report failure per call;
//!   the caller decides whether to skip, abort, or retry.
//!
//! ## Quick Start
//!
//! ```no_run
//! use prepai_embed::{EmbedConfig, EmbeddingProvider, FastEmbedProvider};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let provider = FastEmbedProvider::create(EmbedConfig::minilm_l6()).await?;
//!
//! let embedding = provider.embed_text("Tell me about yourself.").await?;
//! assert_eq!(embedding.len(), provider.embedding_dimension());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod provider;

// Re-export main types for easy access
pub use config::{DEFAULT_MODEL_NAME, EmbedConfig};
pub use error::{EmbedError, Result};
pub use provider::{EmbeddingProvider, EmbeddingResult, FastEmbedProvider};
