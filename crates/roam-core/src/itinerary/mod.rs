//! Day-by-day itinerary for the trip currently being planned.
//!
//! The planner is either uninitialized or holds one active trip with a
//! bucket per day. Out-of-range days and indices are errors; a failed
//! call never changes state.

pub mod dates;
pub mod session;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use session::Session;

/// Upper bound on a planned trip's length.
pub const MAX_TRIP_DAYS: u32 = 366;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ItineraryError {
    #[error("destination must not be empty")]
    EmptyDestination,

    #[error("both a start date and an end date are required")]
    MissingDates,

    #[error("invalid date {value:?}, expected YYYY-MM-DD")]
    InvalidDate { value: String },

    #[error("end date {end} is before start date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },

    #[error("trip is longer than {} days", MAX_TRIP_DAYS)]
    TooLong,

    #[error("please log in first")]
    NotLoggedIn,

    #[error("no active trip; create one with `new`")]
    NoActiveTrip,

    #[error("day {day} is out of range (trip has {num_days} days)")]
    DayOutOfRange { day: u32, num_days: u32 },

    #[error("day {day} has no item at index {index} ({len} items)")]
    ItemOutOfRange { day: u32, index: usize, len: usize },

    #[error("day {day} has no item with id {id:?}")]
    ItemNotFound { day: u32, id: String },

    #[error("no search result #{0}; run `search` first")]
    NoSuchResult(usize),
}

impl ItineraryError {
    /// Missing or inconsistent input, as opposed to a reference to
    /// something that does not exist.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::EmptyDestination
                | Self::MissingDates
                | Self::InvalidDate { .. }
                | Self::EndBeforeStart { .. }
                | Self::TooLong
                | Self::NotLoggedIn
                | Self::NoActiveTrip
        )
    }
}

/// A place assigned to a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItineraryItem {
    pub id: String,
    pub name: String,
}

/// The trip being planned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveTrip {
    pub destination: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub num_days: u32,
    days: BTreeMap<u32, Vec<ItineraryItem>>,
}

impl ActiveTrip {
    fn new(destination: &str, start: NaiveDate, end: NaiveDate) -> Result<Self, ItineraryError> {
        if destination.trim().is_empty() {
            return Err(ItineraryError::EmptyDestination);
        }
        let num_days = dates::trip_length(start, end)?;
        if num_days > MAX_TRIP_DAYS {
            return Err(ItineraryError::TooLong);
        }
        let days = (1..=num_days).map(|d| (d, Vec::new())).collect();
        Ok(Self {
            destination: destination.trim().to_owned(),
            start,
            end,
            num_days,
            days,
        })
    }

    fn bucket_mut(&mut self, day: u32) -> Result<&mut Vec<ItineraryItem>, ItineraryError> {
        let num_days = self.num_days;
        self.days
            .get_mut(&day)
            .ok_or(ItineraryError::DayOutOfRange { day, num_days })
    }

    fn bucket(&self, day: u32) -> Result<&[ItineraryItem], ItineraryError> {
        self.days
            .get(&day)
            .map(Vec::as_slice)
            .ok_or(ItineraryError::DayOutOfRange {
                day,
                num_days: self.num_days,
            })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PlannerState {
    #[default]
    Uninitialized,
    Active(ActiveTrip),
}

/// Itinerary state machine.
#[derive(Debug, Clone, Default)]
pub struct Planner {
    state: PlannerState,
}

impl Planner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &PlannerState {
        &self.state
    }

    pub fn active(&self) -> Option<&ActiveTrip> {
        match &self.state {
            PlannerState::Active(trip) => Some(trip),
            PlannerState::Uninitialized => None,
        }
    }

    fn active_mut(&mut self) -> Result<&mut ActiveTrip, ItineraryError> {
        match &mut self.state {
            PlannerState::Active(trip) => Ok(trip),
            PlannerState::Uninitialized => Err(ItineraryError::NoActiveTrip),
        }
    }

    /// Start planning a new trip, replacing any current itinerary.
    pub fn start_trip(
        &mut self,
        destination: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<&ActiveTrip, ItineraryError> {
        let (Some(start), Some(end)) = (start, end) else {
            return Err(ItineraryError::MissingDates);
        };
        let trip = ActiveTrip::new(destination, start, end)?;
        self.state = PlannerState::Active(trip);
        self.active().ok_or(ItineraryError::NoActiveTrip)
    }

    pub fn reset(&mut self) {
        self.state = PlannerState::Uninitialized;
    }

    pub fn num_days(&self) -> Option<u32> {
        self.active().map(|t| t.num_days)
    }

    /// Append an item to the end of `day`.
    pub fn add_item(&mut self, day: u32, item: ItineraryItem) -> Result<(), ItineraryError> {
        self.active_mut()?.bucket_mut(day)?.push(item);
        Ok(())
    }

    /// Remove the item at `index` (0-based) from `day`.
    pub fn remove_item(&mut self, day: u32, index: usize) -> Result<ItineraryItem, ItineraryError> {
        let bucket = self.active_mut()?.bucket_mut(day)?;
        if index >= bucket.len() {
            return Err(ItineraryError::ItemOutOfRange {
                day,
                index,
                len: bucket.len(),
            });
        }
        Ok(bucket.remove(index))
    }

    /// Remove the first item on `day` whose id is `id`.
    pub fn remove_item_by_id(&mut self, day: u32, id: &str) -> Result<ItineraryItem, ItineraryError> {
        let bucket = self.active_mut()?.bucket_mut(day)?;
        let pos = bucket
            .iter()
            .position(|item| item.id == id)
            .ok_or_else(|| ItineraryError::ItemNotFound {
                day,
                id: id.to_owned(),
            })?;
        Ok(bucket.remove(pos))
    }

    /// Items on `day`, in insertion order.
    pub fn day(&self, day: u32) -> Result<&[ItineraryItem], ItineraryError> {
        self.active()
            .ok_or(ItineraryError::NoActiveTrip)?
            .bucket(day)
    }

    /// Every day bucket in day order. Empty when uninitialized.
    pub fn days(&self) -> impl Iterator<Item = (u32, &[ItineraryItem])> {
        self.active()
            .into_iter()
            .flat_map(|t| t.days.iter().map(|(d, items)| (*d, items.as_slice())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> Option<NaiveDate> {
        Some(NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap())
    }

    fn item(id: &str) -> ItineraryItem {
        ItineraryItem {
            id: id.to_owned(),
            name: format!("Place {id}"),
        }
    }

    fn planner_with_days(n: u32) -> Planner {
        let mut p = Planner::new();
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = start + chrono::Days::new(u64::from(n - 1));
        p.start_trip("Tokyo", Some(start), Some(end)).unwrap();
        p
    }

    #[test]
    fn new_trip_has_empty_bucket_per_day() {
        let mut p = Planner::new();
        let trip = p
            .start_trip("Tokyo", date("2024-01-01"), date("2024-01-03"))
            .unwrap();
        assert_eq!(trip.num_days, 3);

        let days: Vec<u32> = p.days().map(|(d, _)| d).collect();
        assert_eq!(days, [1, 2, 3]);
        assert!(p.days().all(|(_, items)| items.is_empty()));
    }

    #[test]
    fn rejected_trip_leaves_state_unchanged() {
        let mut p = Planner::new();
        let err = p
            .start_trip("Tokyo", date("2024-01-03"), date("2024-01-01"))
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(p.state(), &PlannerState::Uninitialized);

        let err = p.start_trip("Tokyo", date("2024-01-01"), None).unwrap_err();
        assert_eq!(err, ItineraryError::MissingDates);
        assert_eq!(p.state(), &PlannerState::Uninitialized);

        let err = p
            .start_trip(" ", date("2024-01-01"), date("2024-01-01"))
            .unwrap_err();
        assert_eq!(err, ItineraryError::EmptyDestination);
    }

    #[test]
    fn new_trip_discards_previous_itinerary() {
        let mut p = planner_with_days(2);
        p.add_item(1, item("a")).unwrap();

        p.start_trip("Paris", date("2024-06-01"), date("2024-06-01"))
            .unwrap();
        assert_eq!(p.num_days(), Some(1));
        assert!(p.day(1).unwrap().is_empty());
    }

    #[test]
    fn add_then_remove_restores_empty_day() {
        let mut p = planner_with_days(2);
        p.add_item(2, item("x")).unwrap();
        assert_eq!(p.day(2).unwrap().len(), 1);

        let removed = p.remove_item(2, 0).unwrap();
        assert_eq!(removed.id, "x");
        assert!(p.day(2).unwrap().is_empty());
    }

    #[test]
    fn items_keep_insertion_order() {
        let mut p = planner_with_days(1);
        for id in ["a", "b", "c"] {
            p.add_item(1, item(id)).unwrap();
        }
        p.remove_item(1, 1).unwrap();
        let ids: Vec<&str> = p.day(1).unwrap().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["a", "c"]);
    }

    #[test]
    fn out_of_range_day_fails_loudly() {
        let mut p = planner_with_days(3);
        assert_eq!(
            p.add_item(0, item("a")),
            Err(ItineraryError::DayOutOfRange { day: 0, num_days: 3 })
        );
        assert_eq!(
            p.add_item(4, item("a")),
            Err(ItineraryError::DayOutOfRange { day: 4, num_days: 3 })
        );
        assert!(p.days().all(|(_, items)| items.is_empty()));
    }

    #[test]
    fn out_of_range_index_fails_loudly() {
        let mut p = planner_with_days(1);
        p.add_item(1, item("a")).unwrap();
        assert_eq!(
            p.remove_item(1, 1),
            Err(ItineraryError::ItemOutOfRange { day: 1, index: 1, len: 1 })
        );
        assert_eq!(p.day(1).unwrap().len(), 1);
    }

    #[test]
    fn remove_by_id_takes_first_match() {
        let mut p = planner_with_days(1);
        p.add_item(1, item("a")).unwrap();
        p.add_item(1, item("b")).unwrap();
        p.add_item(1, item("a")).unwrap();

        p.remove_item_by_id(1, "a").unwrap();
        let ids: Vec<&str> = p.day(1).unwrap().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["b", "a"]);

        assert!(matches!(
            p.remove_item_by_id(1, "zzz"),
            Err(ItineraryError::ItemNotFound { .. })
        ));
    }

    #[test]
    fn mutations_need_an_active_trip() {
        let mut p = Planner::new();
        assert_eq!(p.add_item(1, item("a")), Err(ItineraryError::NoActiveTrip));
        assert_eq!(p.day(1), Err(ItineraryError::NoActiveTrip));
        assert_eq!(p.days().count(), 0);
    }

    #[test]
    fn reset_returns_to_uninitialized() {
        let mut p = planner_with_days(2);
        p.reset();
        assert_eq!(p.state(), &PlannerState::Uninitialized);
        assert_eq!(p.num_days(), None);
    }
}
