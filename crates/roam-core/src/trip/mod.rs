//! Trip records: validation, listing queries and the repository.

pub mod filter;
pub mod repository;

use thiserror::Error;
use uuid::Uuid;

use roam_db::StoreError;
use roam_db::models::NewTrip;

pub use filter::{DayFilter, ListedTrip, SortKey, TripQuery, TripSummary, apply_query};
pub use repository::TripRepository;

/// Errors from trip operations.
#[derive(Debug, Error)]
pub enum TripError {
    #[error("destination must not be empty")]
    EmptyDestination,

    #[error("days must be a positive whole number")]
    InvalidDays,

    #[error("budget must be a non-negative number, got {0}")]
    InvalidBudget(f64),

    #[error("nothing to update: no fields were given")]
    EmptyUpdate,

    #[error("trip {0} not found")]
    NotFound(Uuid),

    #[error("no trip matches id {0:?}")]
    UnknownId(String),

    #[error("id prefix {0:?} matches more than one trip")]
    AmbiguousId(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl TripError {
    /// Whether this is a user-input problem (as opposed to a storage fault).
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::EmptyDestination | Self::InvalidDays | Self::InvalidBudget(_) | Self::EmptyUpdate
        )
    }
}

pub(crate) fn validate_destination(destination: &str) -> Result<(), TripError> {
    if destination.trim().is_empty() {
        return Err(TripError::EmptyDestination);
    }
    Ok(())
}

pub(crate) fn validate_days(days: u32) -> Result<(), TripError> {
    if days == 0 {
        return Err(TripError::InvalidDays);
    }
    Ok(())
}

pub(crate) fn validate_budget(budget: f64) -> Result<(), TripError> {
    if !budget.is_finite() || budget < 0.0 {
        return Err(TripError::InvalidBudget(budget));
    }
    Ok(())
}

/// Check every field of a new trip.
pub fn validate_new_trip(new_trip: &NewTrip) -> Result<(), TripError> {
    validate_destination(&new_trip.destination)?;
    validate_days(new_trip.days)?;
    validate_budget(new_trip.budget)?;
    Ok(())
}
