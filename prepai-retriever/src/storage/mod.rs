//! Snapshot persistence for the retrieval store.

pub mod snapshot_store;

pub use snapshot_store::SnapshotStore;
