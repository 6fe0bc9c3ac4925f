//! The trip repository.
//!
//! Every mutation is a read-modify-write of the whole `trips` collection
//! guarded by the store's version stamp. When another writer slips in
//! between the read and the write, the mutation is re-applied to a fresh
//! read, up to [`MAX_CONFLICT_RETRIES`] times.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use roam_db::KvStore;
use roam_db::collections::trips::{load_trips, save_trips};
use roam_db::models::{NewTrip, Trip, TripUpdate};

use super::filter::{ListedTrip, TripQuery, TripSummary, apply_query};
use super::{TripError, validate_budget, validate_days, validate_destination, validate_new_trip};
use crate::events::{ChangeEvent, EventBus};

/// How many times a conflicting write is retried before giving up.
pub const MAX_CONFLICT_RETRIES: usize = 3;

/// Shortest id prefix accepted by [`TripRepository::resolve_id`].
pub const MIN_ID_PREFIX: usize = 4;

/// CRUD over the stored trip collection.
#[derive(Clone)]
pub struct TripRepository {
    store: Arc<dyn KvStore>,
    events: EventBus,
}

impl TripRepository {
    pub fn new(store: Arc<dyn KvStore>, events: EventBus) -> Self {
        Self { store, events }
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Append a new trip (not visited) and return it.
    pub async fn create(&self, new_trip: NewTrip) -> Result<Trip, TripError> {
        validate_new_trip(&new_trip)?;

        let trip = Trip {
            id: Uuid::new_v4(),
            destination: new_trip.destination,
            days: new_trip.days,
            notes: new_trip.notes,
            budget: new_trip.budget,
            image: new_trip.image,
            visited: false,
            created_at: Utc::now(),
        };

        let created = self
            .mutate(|trips| {
                trips.push(trip.clone());
                Ok(trip.clone())
            })
            .await?;

        tracing::info!(id = %created.id, destination = %created.destination, "trip created");
        self.events.emit(ChangeEvent::TripCreated { id: created.id });
        Ok(created)
    }

    /// All trips in stored order.
    pub async fn all(&self) -> Result<Vec<Trip>, TripError> {
        Ok(load_trips(self.store.as_ref()).await?.items)
    }

    /// Filtered and sorted listing. Stored order is left alone.
    pub async fn list(&self, query: &TripQuery) -> Result<Vec<ListedTrip>, TripError> {
        let trips = self.all().await?;
        Ok(apply_query(&trips, query))
    }

    /// Totals over the same selection [`Self::list`] would return.
    pub async fn summary(&self, query: &TripQuery) -> Result<TripSummary, TripError> {
        let listed = self.list(query).await?;
        Ok(TripSummary::of(&listed))
    }

    pub async fn get(&self, id: Uuid) -> Result<Trip, TripError> {
        self.all()
            .await?
            .into_iter()
            .find(|t| t.id == id)
            .ok_or(TripError::NotFound(id))
    }

    /// Resolve a full UUID or a unique prefix (at least
    /// [`MIN_ID_PREFIX`] characters) to a trip id.
    pub async fn resolve_id(&self, text: &str) -> Result<Uuid, TripError> {
        let text = text.trim();
        if let Ok(id) = Uuid::parse_str(text) {
            return Ok(id);
        }
        if text.len() < MIN_ID_PREFIX {
            return Err(TripError::UnknownId(text.to_owned()));
        }

        let needle = text.to_lowercase();
        let trips = self.all().await?;
        let mut matches = trips
            .iter()
            .filter(|t| t.id.to_string().starts_with(&needle));

        match (matches.next(), matches.next()) {
            (Some(t), None) => Ok(t.id),
            (Some(_), Some(_)) => Err(TripError::AmbiguousId(text.to_owned())),
            (None, _) => Err(TripError::UnknownId(text.to_owned())),
        }
    }

    /// Overwrite the given fields of trip `id`.
    pub async fn update(&self, id: Uuid, update: TripUpdate) -> Result<Trip, TripError> {
        if update.is_empty() {
            return Err(TripError::EmptyUpdate);
        }
        if let Some(ref destination) = update.destination {
            validate_destination(destination)?;
        }
        if let Some(days) = update.days {
            validate_days(days)?;
        }
        if let Some(budget) = update.budget {
            validate_budget(budget)?;
        }

        let updated = self
            .mutate(|trips| {
                let trip = find_mut(trips, id)?;
                update.apply_to(trip);
                Ok(trip.clone())
            })
            .await?;

        tracing::info!(%id, "trip updated");
        self.events.emit(ChangeEvent::TripUpdated { id });
        Ok(updated)
    }

    /// Remove trip `id` and return it. Callers confirm with the user first.
    pub async fn delete(&self, id: Uuid) -> Result<Trip, TripError> {
        let removed = self
            .mutate(|trips| {
                let pos = trips
                    .iter()
                    .position(|t| t.id == id)
                    .ok_or(TripError::NotFound(id))?;
                Ok(trips.remove(pos))
            })
            .await?;

        tracing::info!(%id, destination = %removed.destination, "trip deleted");
        self.events.emit(ChangeEvent::TripDeleted { id });
        Ok(removed)
    }

    /// Flip the visited flag of trip `id`.
    pub async fn toggle_visited(&self, id: Uuid) -> Result<Trip, TripError> {
        let toggled = self
            .mutate(|trips| {
                let trip = find_mut(trips, id)?;
                trip.visited = !trip.visited;
                Ok(trip.clone())
            })
            .await?;

        tracing::info!(%id, visited = toggled.visited, "trip visited toggled");
        self.events.emit(ChangeEvent::VisitedToggled {
            id,
            visited: toggled.visited,
        });
        Ok(toggled)
    }

    /// Load, apply `f`, and write back at the version that was read.
    async fn mutate<T, F>(&self, mut f: F) -> Result<T, TripError>
    where
        F: FnMut(&mut Vec<Trip>) -> Result<T, TripError>,
    {
        let mut retries = 0;
        loop {
            let loaded = load_trips(self.store.as_ref()).await?;
            let mut trips = loaded.items;
            let out = f(&mut trips)?;

            match save_trips(self.store.as_ref(), &trips, loaded.version).await {
                Ok(_) => return Ok(out),
                Err(e) if e.is_conflict() && retries < MAX_CONFLICT_RETRIES => {
                    retries += 1;
                    tracing::warn!(retries, error = %e, "trip write conflicted, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

fn find_mut(trips: &mut [Trip], id: Uuid) -> Result<&mut Trip, TripError> {
    trips
        .iter_mut()
        .find(|t| t.id == id)
        .ok_or(TripError::NotFound(id))
}
