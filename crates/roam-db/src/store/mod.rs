//! The versioned key-value store behind every roam collection.
//!
//! Each key holds one serialized value plus a version stamp. Version 0
//! means the key is absent. Writes are compare-and-swap on the version:
//! a writer that read version `n` may only replace the value while it is
//! still at `n`, and the new value is stored at `n + 1`.

pub mod file;
pub mod memory;
pub mod pg;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::StorageConfig;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use pg::PgStore;

/// The value stored under a key together with its version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// 0 when the key has never been written.
    pub version: u64,
    pub value: Option<String>,
}

impl Snapshot {
    pub fn absent() -> Self {
        Self {
            version: 0,
            value: None,
        }
    }
}

/// Errors raised by store backends.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("version conflict on key {key:?}: expected {expected}, found {actual}")]
    VersionConflict {
        key: String,
        expected: u64,
        actual: u64,
    },

    #[error("stored value under {key:?} is malformed: {source}")]
    Malformed {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::VersionConflict { .. })
    }
}

/// Backend interface for the key-value store.
///
/// Object-safe so repositories can hold an `Arc<dyn KvStore>`.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Read the current value and version of `key`.
    async fn get(&self, key: &str) -> Result<Snapshot, StoreError>;

    /// Replace the value of `key` if it is still at `expected_version`.
    ///
    /// Returns the new version. Fails with
    /// [`StoreError::VersionConflict`] when another writer got there first.
    async fn put(&self, key: &str, value: String, expected_version: u64)
    -> Result<u64, StoreError>;
}

/// Open the backend described by `config`.
pub async fn open_store(config: &StorageConfig) -> Result<Arc<dyn KvStore>> {
    let store: Arc<dyn KvStore> = match config {
        StorageConfig::File { path } => Arc::new(FileStore::new(path.clone())),
        StorageConfig::Postgres(db_config) => Arc::new(PgStore::connect(db_config).await?),
        StorageConfig::Memory => Arc::new(MemoryStore::new()),
    };
    tracing::debug!(backend = store.name(), "opened store");
    Ok(store)
}

// Compile-time assertion: KvStore must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn KvStore) {}
};
