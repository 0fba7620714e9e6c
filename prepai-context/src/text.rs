//! Fixed-size text chunking for retrieval contexts.
//!
//! This module turns a raw document string into an ordered sequence of
//! [`TextChunk`]s suitable for embedding and similarity retrieval. Splitting
//! is deliberately simple: consecutive, non-overlapping spans of a fixed
//! number of characters, so a chunk's position in the sequence is all the
//! bookkeeping the surrounding store needs.
//!
//! # Reconstruction invariant
//!
//! Concatenating the chunk texts in `sequence` order reproduces the input
//! exactly; no characters are dropped or duplicated, and no zero-length
//! chunk is ever produced.
//!
//! ```
//! use prepai_context::text::TextSplitter;
//!
//! let splitter = TextSplitter::new(4);
//! let chunks = splitter.split("ABCDEFGHIJ");
//!
//! let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
//! assert_eq!(texts, ["ABCD", "EFGH", "IJ"]);
//!
//! let reconstructed: String = chunks.iter().map(|c| c.text.as_str()).collect();
//! assert_eq!(reconstructed, "ABCDEFGHIJ");
//! ```
//!
//! Sizes are measured in characters (Unicode scalar values), not bytes, so
//! multi-byte text never splits inside a character.

use serde::Serialize;

/// Default maximum chunk length, in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Splits document text into fixed-size, order-preserving chunks.
///
/// Every chunk except possibly the last holds exactly `chunk_size`
/// characters; the last holds the remainder (between 1 and `chunk_size`
/// characters). Empty input yields no chunks.
///
/// Splitting is a pure function of the input: the same text and size always
/// produce the same chunk sequence.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
}

/// A single chunk of text, with its 0-based position in the source document.
///
/// The `sequence` of a chunk equals its insertion position in whatever store
/// consumes the splitter's output, which is what keeps chunk texts and their
/// embeddings aligned downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextChunk {
    /// The order of this chunk within the source document (0-indexed).
    pub sequence: usize,
    /// The text content of this chunk.
    pub text: String,
}

impl TextSplitter {
    /// Creates a splitter producing chunks of at most `chunk_size` characters.
    ///
    /// # Panics
    ///
    /// Panics if `chunk_size` is zero. A zero-size chunk can never satisfy
    /// the reconstruction invariant, so this is a caller bug rather than a
    /// runtime condition.
    pub fn new(chunk_size: usize) -> Self {
        assert!(chunk_size >= 1, "chunk_size must be at least 1");
        TextSplitter { chunk_size }
    }

    /// Creates a splitter with the default chunk size of 500 characters.
    pub fn with_default_size() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }

    /// The configured maximum chunk length, in characters.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Splits `text` into consecutive chunks of `chunk_size` characters.
    ///
    /// Returns an empty vector for empty input. Otherwise every returned
    /// chunk is non-empty, chunks appear in document order, and their
    /// concatenation equals `text`.
    pub fn split(&self, text: &str) -> Vec<TextChunk> {
        let mut chunks = Vec::new();
        let mut start = 0;
        let mut chars_in_chunk = 0;

        for (byte_idx, _) in text.char_indices() {
            if chars_in_chunk == self.chunk_size {
                chunks.push(TextChunk {
                    sequence: chunks.len(),
                    text: text[start..byte_idx].to_string(),
                });
                start = byte_idx;
                chars_in_chunk = 0;
            }
            chars_in_chunk += 1;
        }

        // Remainder: everything after the last full chunk boundary.
        if start < text.len() {
            chunks.push(TextChunk {
                sequence: chunks.len(),
                text: text[start..].to_string(),
            });
        }

        chunks
    }
}
