//! Durable snapshots of the (vector index, document store) pair.
//!
//! A snapshot is two co-located artifacts under the storage directory:
//!
//! - `vectors.bin`: a versioned binary file, a fixed header (magic bytes,
//!   format version, dimension, entry count, little-endian fields) followed
//!   by the raw f32 vector payload in insertion order.
//! - `documents.json`: the chunk texts as a JSON array, in the same order.
//!
//! Every save writes the full current state; there is no incremental
//! format. Both artifacts are written to temporary siblings first and only
//! renamed into place after both writes succeed, so a crash mid-save leaves
//! the previous complete snapshot as the canonical one. A crash between the
//! two renames produces artifacts whose entry counts disagree, which `load`
//! rejects as corrupt instead of misreading.
//!
//! `load` treats "neither file exists" as a normal first start and returns
//! an empty result. Everything else that is not a fully consistent pair
//! (one file missing, unknown magic or version, a dimension other than the
//! configured one, truncated payload, count mismatch) is fatal.

use crate::error::{Result, RetrievalError};
use crate::retrieval::document_store::DocumentStore;
use crate::retrieval::vector_index::VectorIndex;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// File name of the vector artifact within the storage directory.
pub const VECTORS_FILE: &str = "vectors.bin";

/// File name of the document artifact within the storage directory.
pub const DOCUMENTS_FILE: &str = "documents.json";

const SNAPSHOT_MAGIC: [u8; 4] = *b"PAVS";
const SNAPSHOT_VERSION: u32 = 1;

// magic (4) + version (4) + dimension (4) + count (8)
const HEADER_LEN: usize = 20;

/// Reads and writes snapshots of the retrieval store under one directory.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    /// Creates a snapshot store rooted at `dir`. The directory is created
    /// lazily on first save.
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        SnapshotStore { dir: dir.into() }
    }

    /// The storage directory.
    pub fn directory(&self) -> &Path {
        &self.dir
    }

    /// Canonical path of the vector artifact.
    pub fn vectors_path(&self) -> PathBuf {
        self.dir.join(VECTORS_FILE)
    }

    /// Canonical path of the document artifact.
    pub fn documents_path(&self) -> PathBuf {
        self.dir.join(DOCUMENTS_FILE)
    }

    /// Writes a full snapshot of `index` and `documents`.
    ///
    /// Both artifacts are staged as temporary files and atomically promoted
    /// only after both writes succeed.
    pub async fn save(&self, index: &VectorIndex, documents: &DocumentStore) -> Result<()> {
        debug_assert_eq!(index.count(), documents.count());

        fs::create_dir_all(&self.dir).await?;

        let vector_bytes = encode_vectors(index);
        let document_bytes = serde_json::to_vec(documents.texts())?;

        let vectors_tmp = self.dir.join(tmp_name(VECTORS_FILE));
        let documents_tmp = self.dir.join(tmp_name(DOCUMENTS_FILE));

        fs::write(&vectors_tmp, &vector_bytes).await?;
        fs::write(&documents_tmp, &document_bytes).await?;

        // Promote only once both temporaries are fully written.
        fs::rename(&vectors_tmp, self.vectors_path()).await?;
        fs::rename(&documents_tmp, self.documents_path()).await?;

        debug!(
            entries = index.count(),
            dir = %self.dir.display(),
            "Persisted snapshot"
        );
        Ok(())
    }

    /// Loads the snapshot pair, validating it against the configured
    /// `dimension`.
    ///
    /// Returns `Ok(None)` when neither artifact exists, since no prior state
    /// is a normal startup condition. A partial pair, malformed artifact, entry
    /// count disagreement, or dimension disagreement is an error.
    pub async fn load(&self, dimension: usize) -> Result<Option<(VectorIndex, DocumentStore)>> {
        let vectors_path = self.vectors_path();
        let documents_path = self.documents_path();

        let have_vectors = fs::try_exists(&vectors_path).await?;
        let have_documents = fs::try_exists(&documents_path).await?;

        match (have_vectors, have_documents) {
            (false, false) => Ok(None),
            (true, false) => Err(RetrievalError::corrupt(format!(
                "vector data exists but document list is missing: {}",
                documents_path.display()
            ))),
            (false, true) => Err(RetrievalError::corrupt(format!(
                "document list exists but vector data is missing: {}",
                vectors_path.display()
            ))),
            (true, true) => {
                let vector_bytes = fs::read(&vectors_path).await?;
                let index = decode_vectors(&vector_bytes, dimension)?;

                let document_bytes = fs::read(&documents_path).await?;
                let texts: Vec<String> = serde_json::from_slice(&document_bytes)?;

                if texts.len() != index.count() {
                    return Err(RetrievalError::corrupt(format!(
                        "snapshot entry counts disagree: {} vectors, {} documents",
                        index.count(),
                        texts.len()
                    )));
                }

                debug!(
                    entries = index.count(),
                    dir = %self.dir.display(),
                    "Loaded snapshot"
                );
                Ok(Some((index, DocumentStore::from_texts(texts))))
            }
        }
    }
}

fn tmp_name(name: &str) -> String {
    format!("{name}.tmp")
}

/// Serializes the index as header + raw f32 payload.
fn encode_vectors(index: &VectorIndex) -> Vec<u8> {
    let payload: &[u8] = bytemuck::cast_slice(index.raw());

    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
    bytes.extend_from_slice(&SNAPSHOT_MAGIC);
    bytes.extend_from_slice(&SNAPSHOT_VERSION.to_le_bytes());
    bytes.extend_from_slice(&(index.dimension() as u32).to_le_bytes());
    bytes.extend_from_slice(&(index.count() as u64).to_le_bytes());
    bytes.extend_from_slice(payload);
    bytes
}

/// Parses and validates a vector artifact against the configured dimension.
fn decode_vectors(bytes: &[u8], expected_dimension: usize) -> Result<VectorIndex> {
    if bytes.len() < HEADER_LEN {
        return Err(RetrievalError::corrupt(format!(
            "vector data truncated: {} bytes is shorter than the header",
            bytes.len()
        )));
    }

    let magic = &bytes[0..4];
    if magic != SNAPSHOT_MAGIC {
        return Err(RetrievalError::corrupt(format!(
            "unrecognized vector data magic: {magic:?}"
        )));
    }

    let version = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
    if version != SNAPSHOT_VERSION {
        return Err(RetrievalError::corrupt(format!(
            "unsupported snapshot format version {version} (expected {SNAPSHOT_VERSION})"
        )));
    }

    let dimension = u32::from_le_bytes(bytes[8..12].try_into().unwrap()) as usize;
    if dimension != expected_dimension {
        return Err(RetrievalError::DimensionMismatch {
            expected: expected_dimension,
            actual: dimension,
        });
    }

    let count = u64::from_le_bytes(bytes[12..20].try_into().unwrap());
    let payload = &bytes[HEADER_LEN..];
    let expected_payload_len = count
        .checked_mul(dimension as u64)
        .and_then(|n| n.checked_mul(std::mem::size_of::<f32>() as u64));
    if expected_payload_len != Some(payload.len() as u64) {
        return Err(RetrievalError::corrupt(format!(
            "vector payload length {} does not match header ({count} entries of dimension {dimension})",
            payload.len()
        )));
    }

    // pod_collect_to_vec copies, so the payload need not be aligned for f32.
    let vectors: Vec<f32> = bytemuck::pod_collect_to_vec(payload);
    Ok(VectorIndex::from_raw(dimension, vectors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_state(dimension: usize) -> (VectorIndex, DocumentStore) {
        let mut index = VectorIndex::new(dimension);
        let mut documents = DocumentStore::new();
        for i in 0..4u8 {
            let value = f32::from(i);
            index.append(&vec![value; dimension]).unwrap();
            documents.append(format!("chunk {i}"));
        }
        (index, documents)
    }

    #[tokio::test]
    async fn test_save_then_load_round_trip() {
        let dir = tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("snapshots"));

        let (index, documents) = sample_state(3);
        store.save(&index, &documents).await.unwrap();

        let (loaded_index, loaded_documents) = store.load(3).await.unwrap().unwrap();
        assert_eq!(loaded_index.count(), 4);
        assert_eq!(loaded_index.dimension(), 3);
        assert_eq!(loaded_index.raw(), index.raw());
        assert_eq!(loaded_documents.texts(), documents.texts());
    }

    #[tokio::test]
    async fn test_load_missing_snapshot_is_empty_start() {
        let dir = tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("never-written"));
        assert!(store.load(3).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_load_rejects_partial_pair() {
        let dir = tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());

        let (index, documents) = sample_state(3);
        store.save(&index, &documents).await.unwrap();

        std::fs::remove_file(store.documents_path()).unwrap();
        let err = store.load(3).await.unwrap_err();
        assert!(matches!(err, RetrievalError::Corrupt { .. }));
    }

    #[tokio::test]
    async fn test_load_rejects_wrong_dimension() {
        let dir = tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());

        let (index, documents) = sample_state(3);
        store.save(&index, &documents).await.unwrap();

        let err = store.load(5).await.unwrap_err();
        assert!(matches!(
            err,
            RetrievalError::DimensionMismatch {
                expected: 5,
                actual: 3
            }
        ));
    }

    #[tokio::test]
    async fn test_load_rejects_bad_magic() {
        let dir = tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());

        let (index, documents) = sample_state(3);
        store.save(&index, &documents).await.unwrap();

        let mut bytes = std::fs::read(store.vectors_path()).unwrap();
        bytes[0] = b'X';
        std::fs::write(store.vectors_path(), &bytes).unwrap();

        let err = store.load(3).await.unwrap_err();
        assert!(matches!(err, RetrievalError::Corrupt { .. }));
    }

    #[tokio::test]
    async fn test_load_rejects_truncated_payload() {
        let dir = tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());

        let (index, documents) = sample_state(3);
        store.save(&index, &documents).await.unwrap();

        let bytes = std::fs::read(store.vectors_path()).unwrap();
        std::fs::write(store.vectors_path(), &bytes[..bytes.len() - 4]).unwrap();

        let err = store.load(3).await.unwrap_err();
        assert!(matches!(err, RetrievalError::Corrupt { .. }));
    }

    #[tokio::test]
    async fn test_load_rejects_count_disagreement() {
        let dir = tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());

        let (index, documents) = sample_state(3);
        store.save(&index, &documents).await.unwrap();

        // Simulate a crash between the two renames: documents from an older
        // snapshot generation with a different entry count.
        std::fs::write(store.documents_path(), b"[\"only one\"]").unwrap();

        let err = store.load(3).await.unwrap_err();
        assert!(matches!(err, RetrievalError::Corrupt { .. }));
    }

    #[tokio::test]
    async fn test_save_overwrites_previous_snapshot() {
        let dir = tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());

        let (index, documents) = sample_state(3);
        store.save(&index, &documents).await.unwrap();

        let empty_index = VectorIndex::new(3);
        let empty_documents = DocumentStore::new();
        store.save(&empty_index, &empty_documents).await.unwrap();

        let (loaded_index, loaded_documents) = store.load(3).await.unwrap().unwrap();
        assert_eq!(loaded_index.count(), 0);
        assert_eq!(loaded_documents.count(), 0);
    }
}
