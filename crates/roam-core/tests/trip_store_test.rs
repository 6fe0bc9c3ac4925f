//! Trip and feedback repositories over the file and PostgreSQL backends.
//!
//! The file tests run anywhere. The PostgreSQL tests use the shared
//! instance from `roam-test-utils` and get a fresh database each.

use std::sync::Arc;

use roam_core::EventBus;
use roam_core::feedback::FeedbackRepository;
use roam_core::trip::{DayFilter, SortKey, TripError, TripQuery, TripRepository};
use roam_db::KvStore;
use roam_db::models::NewTrip;
use roam_db::store::FileStore;
use roam_test_utils::{create_test_store, drop_test_db};

fn new_trip(destination: &str, days: u32) -> NewTrip {
    NewTrip {
        destination: destination.to_owned(),
        days,
        budget: 50.0,
        ..NewTrip::default()
    }
}

fn file_store(dir: &tempfile::TempDir) -> Arc<dyn KvStore> {
    Arc::new(FileStore::new(dir.path().join("store.json")))
}

#[tokio::test]
async fn trips_survive_reopening_the_file() {
    let dir = tempfile::tempdir().unwrap();

    let created = {
        let repo = TripRepository::new(file_store(&dir), EventBus::new());
        repo.create(new_trip("Goa", 2)).await.unwrap()
    };

    let repo = TripRepository::new(file_store(&dir), EventBus::new());
    assert_eq!(repo.get(created.id).await.unwrap(), created);
}

#[tokio::test]
async fn two_handles_on_one_file_see_each_other() {
    let dir = tempfile::tempdir().unwrap();
    let a = TripRepository::new(file_store(&dir), EventBus::new());
    let b = TripRepository::new(file_store(&dir), EventBus::new());

    let paris = a.create(new_trip("Paris", 4)).await.unwrap();
    b.create(new_trip("Tokyo", 6)).await.unwrap();
    b.toggle_visited(paris.id).await.unwrap();

    let all = a.all().await.unwrap();
    let names: Vec<&str> = all.iter().map(|t| t.destination.as_str()).collect();
    assert_eq!(names, ["Paris", "Tokyo"]);
    assert!(all[0].visited);
}

#[tokio::test]
async fn delete_keeps_other_ids_stable() {
    let dir = tempfile::tempdir().unwrap();
    let repo = TripRepository::new(file_store(&dir), EventBus::new());

    let first = repo.create(new_trip("Delhi", 1)).await.unwrap();
    let second = repo.create(new_trip("Paris", 5)).await.unwrap();
    let third = repo.create(new_trip("London", 9)).await.unwrap();

    repo.delete(first.id).await.unwrap();
    assert_eq!(repo.get(second.id).await.unwrap().destination, "Paris");
    assert_eq!(repo.get(third.id).await.unwrap().destination, "London");

    assert!(matches!(
        repo.delete(first.id).await,
        Err(TripError::NotFound(id)) if id == first.id
    ));
}

#[tokio::test]
async fn listing_filters_and_sorts_without_reordering_storage() {
    let dir = tempfile::tempdir().unwrap();
    let repo = TripRepository::new(file_store(&dir), EventBus::new());
    for (dest, days) in [("Delhi", 2), ("Paris", 10), ("London", 3)] {
        repo.create(new_trip(dest, days)).await.unwrap();
    }

    let short = repo
        .list(&TripQuery {
            day_filter: DayFilter::Short,
            sort: SortKey::Name,
            ..TripQuery::default()
        })
        .await
        .unwrap();
    let names: Vec<&str> = short.iter().map(|l| l.trip.destination.as_str()).collect();
    assert_eq!(names, ["Delhi", "London"]);
    assert_eq!(short[1].position, 2);

    let stored: Vec<String> = repo
        .all()
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.destination)
        .collect();
    assert_eq!(stored, ["Delhi", "Paris", "London"]);
}

#[tokio::test]
async fn pg_trip_lifecycle() {
    let (store, db_url) = create_test_store().await;
    let repo = TripRepository::new(Arc::new(store), EventBus::new());

    let trip = repo.create(new_trip("Tokyo", 4)).await.unwrap();
    let prefix = &trip.id.to_string()[..8];
    assert_eq!(repo.resolve_id(prefix).await.unwrap(), trip.id);

    let visited = repo.toggle_visited(trip.id).await.unwrap();
    assert!(visited.visited);

    repo.delete(trip.id).await.unwrap();
    assert!(repo.all().await.unwrap().is_empty());

    drop_test_db(&db_url).await;
}

#[tokio::test]
async fn pg_feedback_is_shared_between_handles() {
    let (store, db_url) = create_test_store().await;
    let store: Arc<dyn KvStore> = Arc::new(store);
    let a = FeedbackRepository::new(store.clone(), EventBus::new());
    let b = FeedbackRepository::new(store, EventBus::new());

    a.submit("Asha", "Great app").await.unwrap();
    b.submit("Ben", "More cities please").await.unwrap();

    let all = a.list().await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[1].message, "More cities please");

    drop_test_db(&db_url).await;
}
