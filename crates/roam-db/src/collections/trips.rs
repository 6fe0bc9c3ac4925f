//! Load/save for the `trips` collection.

use crate::models::{TRIPS_KEY, Trip};
use crate::store::{KvStore, StoreError};

use super::{Versioned, load_collection, save_collection};

/// Read every stored trip, in stored order.
pub async fn load_trips(store: &dyn KvStore) -> Result<Versioned<Trip>, StoreError> {
    load_collection(store, TRIPS_KEY).await
}

/// Replace the stored trips if nobody wrote since `expected_version`.
pub async fn save_trips(
    store: &dyn KvStore,
    trips: &[Trip],
    expected_version: u64,
) -> Result<u64, StoreError> {
    save_collection(store, TRIPS_KEY, trips, expected_version).await
}
