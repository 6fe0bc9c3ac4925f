use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{KvStore, Snapshot, StoreError};

/// In-process store. Used by tests and the `memory` backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, (u64, String)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Snapshot, StoreError> {
        let entries = self.entries.lock().await;
        Ok(match entries.get(key) {
            Some((version, value)) => Snapshot {
                version: *version,
                value: Some(value.clone()),
            },
            None => Snapshot::absent(),
        })
    }

    async fn put(
        &self,
        key: &str,
        value: String,
        expected_version: u64,
    ) -> Result<u64, StoreError> {
        let mut entries = self.entries.lock().await;
        let actual = entries.get(key).map(|(v, _)| *v).unwrap_or(0);
        if actual != expected_version {
            return Err(StoreError::VersionConflict {
                key: key.to_owned(),
                expected: expected_version,
                actual,
            });
        }
        let next = actual + 1;
        entries.insert(key.to_owned(), (next, value));
        Ok(next)
    }
}
