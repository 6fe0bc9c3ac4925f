//! Load/save for the `feedbacks` collection.

use crate::models::{FEEDBACKS_KEY, Feedback};
use crate::store::{KvStore, StoreError};

use super::{Versioned, load_collection, save_collection};

pub async fn load_feedbacks(store: &dyn KvStore) -> Result<Versioned<Feedback>, StoreError> {
    load_collection(store, FEEDBACKS_KEY).await
}

pub async fn save_feedbacks(
    store: &dyn KvStore,
    feedbacks: &[Feedback],
    expected_version: u64,
) -> Result<u64, StoreError> {
    save_collection(store, FEEDBACKS_KEY, feedbacks, expected_version).await
}
