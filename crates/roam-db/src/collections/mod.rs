//! Typed access to the serialized collections stored under each key.
//!
//! A collection is a JSON array. An absent key reads as an empty
//! collection at version 0.

pub mod feedbacks;
pub mod trips;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::store::{KvStore, StoreError};

/// A decoded collection plus the version it was read at.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub version: u64,
    pub items: Vec<T>,
}

/// Load and decode the array stored under `key`.
pub async fn load_collection<T: DeserializeOwned>(
    store: &dyn KvStore,
    key: &str,
) -> Result<Versioned<T>, StoreError> {
    let snapshot = store.get(key).await?;
    let items = match snapshot.value.as_deref() {
        None => Vec::new(),
        Some(raw) if raw.trim().is_empty() => Vec::new(),
        Some(raw) => serde_json::from_str(raw).map_err(|source| StoreError::Malformed {
            key: key.to_owned(),
            source,
        })?,
    };
    Ok(Versioned {
        version: snapshot.version,
        items,
    })
}

/// Encode `items` and write them under `key` if it is still at
/// `expected_version`. Returns the new version.
pub async fn save_collection<T: Serialize>(
    store: &dyn KvStore,
    key: &str,
    items: &[T],
    expected_version: u64,
) -> Result<u64, StoreError> {
    let encoded = serde_json::to_string(items)?;
    let version = store.put(key, encoded, expected_version).await?;
    tracing::info!(key, version, count = items.len(), "saved collection");
    Ok(version)
}
