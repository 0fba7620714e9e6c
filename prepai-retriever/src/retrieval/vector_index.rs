//! Exact nearest-neighbor index over fixed-dimension vectors.
//!
//! The index is a flat, append-only list of f32 vectors searched by
//! exhaustive scan. Exactness is part of the contract, not an
//! implementation shortcut: callers rely on `knn` returning the true
//! nearest stored vectors, so no approximate structure is used here.
//! Entries are never reordered or individually deleted, which keeps a
//! vector's position equal to its insertion order for the lifetime of the
//! store.

use crate::error::{Result, RetrievalError};

/// In-memory exact k-nearest-neighbor index.
///
/// Vectors are stored row-major in one flat buffer; position `i` occupies
/// `[i * dimension, (i + 1) * dimension)`. Every vector must have exactly
/// the dimension fixed at construction.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    dimension: usize,
    vectors: Vec<f32>,
}

impl VectorIndex {
    /// Creates an empty index for vectors of the given dimension.
    ///
    /// # Panics
    ///
    /// Panics if `dimension` is zero.
    pub fn new(dimension: usize) -> Self {
        assert!(dimension >= 1, "dimension must be at least 1");
        VectorIndex {
            dimension,
            vectors: Vec::new(),
        }
    }

    /// Rebuilds an index from a raw row-major buffer, as read from a snapshot.
    pub(crate) fn from_raw(dimension: usize, vectors: Vec<f32>) -> Self {
        debug_assert!(dimension >= 1);
        debug_assert_eq!(vectors.len() % dimension, 0);
        VectorIndex { dimension, vectors }
    }

    /// The raw row-major vector buffer, for snapshot encoding.
    pub(crate) fn raw(&self) -> &[f32] {
        &self.vectors
    }

    /// The fixed dimension of stored vectors.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// The number of stored vectors.
    pub fn count(&self) -> usize {
        self.vectors.len() / self.dimension
    }

    /// Appends a vector at the next free position.
    ///
    /// Fails with [`RetrievalError::DimensionMismatch`] if the vector's
    /// length differs from the index dimension; nothing is appended in that
    /// case.
    pub fn append(&mut self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(RetrievalError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        self.vectors.extend_from_slice(vector);
        Ok(())
    }

    /// Returns the `min(k, count)` stored vectors nearest to `query`.
    ///
    /// Distances are squared Euclidean, computed against every stored vector
    /// (exhaustive, exact). Results are `(position, distance)` pairs in
    /// ascending distance order; equal distances are broken by lower
    /// position, so the earliest-inserted entry wins. An empty index yields
    /// an empty result, not an error.
    pub fn knn(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        if query.len() != self.dimension {
            return Err(RetrievalError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut hits: Vec<(usize, f32)> = self
            .vectors
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(position, row)| (position, squared_distance(query, row)))
            .collect();

        hits.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        hits.truncate(k);
        Ok(hits)
    }
}

/// Squared Euclidean distance between two equal-length vectors.
fn squared_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}
