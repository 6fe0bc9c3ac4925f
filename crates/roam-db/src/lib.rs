//! Storage layer for roam: record models, the versioned key-value store
//! and its backends, and typed access to the stored collections.

pub mod collections;
pub mod config;
pub mod models;
pub mod store;

pub use store::{KvStore, Snapshot, StoreError};
