//! Search, day-count filtering and sorting for trip listings.
//!
//! Everything here works on a borrowed slice and returns new values;
//! stored order is never touched.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use roam_db::models::Trip;

// ---------------------------------------------------------------------------
// DayFilter
// ---------------------------------------------------------------------------

/// Day-count bucket used to narrow a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayFilter {
    #[default]
    All,
    /// 3 days or fewer.
    Short,
    /// 4 to 7 days.
    Medium,
    /// 8 days or more.
    Long,
}

impl DayFilter {
    pub fn matches(self, days: u32) -> bool {
        match self {
            Self::All => true,
            Self::Short => days <= 3,
            Self::Medium => (4..=7).contains(&days),
            Self::Long => days >= 8,
        }
    }

    /// The next filter in display order, wrapping around.
    pub fn next(self) -> Self {
        match self {
            Self::All => Self::Short,
            Self::Short => Self::Medium,
            Self::Medium => Self::Long,
            Self::Long => Self::All,
        }
    }
}

impl fmt::Display for DayFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::All => "all",
            Self::Short => "short",
            Self::Medium => "medium",
            Self::Long => "long",
        };
        f.write_str(s)
    }
}

impl FromStr for DayFilter {
    type Err = QueryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "short" => Ok(Self::Short),
            "medium" => Ok(Self::Medium),
            "long" => Ok(Self::Long),
            other => Err(QueryParseError::DayFilter(other.to_owned())),
        }
    }
}

// ---------------------------------------------------------------------------
// SortKey
// ---------------------------------------------------------------------------

/// Listing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Stored order.
    #[default]
    None,
    /// Destination, case-insensitive.
    Name,
    /// Day count, ascending.
    Days,
}

impl SortKey {
    pub fn next(self) -> Self {
        match self {
            Self::None => Self::Name,
            Self::Name => Self::Days,
            Self::Days => Self::None,
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::Name => "name",
            Self::Days => "days",
        };
        f.write_str(s)
    }
}

impl FromStr for SortKey {
    type Err = QueryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "name" => Ok(Self::Name),
            "days" => Ok(Self::Days),
            other => Err(QueryParseError::SortKey(other.to_owned())),
        }
    }
}

/// Error returned when parsing a [`DayFilter`] or [`SortKey`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryParseError {
    #[error("invalid day filter {0:?} (expected all, short, medium, or long)")]
    DayFilter(String),
    #[error("invalid sort key {0:?} (expected none, name, or days)")]
    SortKey(String),
}

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

/// Parameters for a trip listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TripQuery {
    /// Case-insensitive substring of the destination. Empty matches all.
    pub search: String,
    pub day_filter: DayFilter,
    pub sort: SortKey,
}

/// A trip plus its position in stored order.
#[derive(Debug, Clone, PartialEq)]
pub struct ListedTrip {
    pub position: usize,
    pub trip: Trip,
}

/// Filter by search text, then by day bucket, then sort.
pub fn apply_query(trips: &[Trip], query: &TripQuery) -> Vec<ListedTrip> {
    let needle = query.search.to_lowercase();

    let mut listed: Vec<ListedTrip> = trips
        .iter()
        .enumerate()
        .filter(|(_, t)| t.destination.to_lowercase().contains(&needle))
        .filter(|(_, t)| query.day_filter.matches(t.days))
        .map(|(position, trip)| ListedTrip {
            position,
            trip: trip.clone(),
        })
        .collect();

    // Both sorts are stable, so ties keep stored order.
    match query.sort {
        SortKey::None => {}
        SortKey::Name => {
            listed.sort_by(|a, b| compare_destinations(&a.trip.destination, &b.trip.destination))
        }
        SortKey::Days => listed.sort_by_key(|l| l.trip.days),
    }

    listed
}

fn compare_destinations(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Totals shown under a listing.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TripSummary {
    pub total_trips: usize,
    pub total_days: u64,
    pub total_estimated_budget: f64,
}

impl TripSummary {
    pub fn of(listed: &[ListedTrip]) -> Self {
        listed.iter().fold(Self::default(), |mut acc, l| {
            acc.total_trips += 1;
            acc.total_days += u64::from(l.trip.days);
            acc.total_estimated_budget += l.trip.estimated_budget();
            acc
        })
    }
}

impl fmt::Display for TripSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Total trips: {} | Total days: {}",
            self.total_trips, self.total_days
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn trip(destination: &str, days: u32) -> Trip {
        Trip {
            id: Uuid::new_v4(),
            destination: destination.to_owned(),
            days,
            notes: None,
            budget: 10.0,
            image: None,
            visited: false,
            created_at: Utc::now(),
        }
    }

    fn names(listed: &[ListedTrip]) -> Vec<&str> {
        listed.iter().map(|l| l.trip.destination.as_str()).collect()
    }

    #[test]
    fn day_buckets_have_the_documented_edges() {
        assert!(DayFilter::Short.matches(3));
        assert!(!DayFilter::Short.matches(4));
        assert!(DayFilter::Medium.matches(4));
        assert!(DayFilter::Medium.matches(7));
        assert!(!DayFilter::Medium.matches(8));
        assert!(DayFilter::Long.matches(8));
        assert!(!DayFilter::Long.matches(7));
        assert!(DayFilter::All.matches(0));
    }

    #[test]
    fn sort_by_name() {
        let trips = vec![trip("Delhi", 2), trip("Paris", 5), trip("London", 9)];
        let query = TripQuery {
            sort: SortKey::Name,
            ..TripQuery::default()
        };
        assert_eq!(names(&apply_query(&trips, &query)), ["Delhi", "London", "Paris"]);
    }

    #[test]
    fn sort_by_name_ignores_case() {
        let trips = vec![trip("paris", 1), trip("Amsterdam", 1), trip("berlin", 1)];
        let query = TripQuery {
            sort: SortKey::Name,
            ..TripQuery::default()
        };
        assert_eq!(names(&apply_query(&trips, &query)), ["Amsterdam", "berlin", "paris"]);
    }

    #[test]
    fn sort_by_days_is_stable() {
        let trips = vec![trip("A", 5), trip("B", 2), trip("C", 5), trip("D", 1)];
        let query = TripQuery {
            sort: SortKey::Days,
            ..TripQuery::default()
        };
        assert_eq!(names(&apply_query(&trips, &query)), ["D", "B", "A", "C"]);
    }

    #[test]
    fn short_filter_is_independent_of_sort() {
        let trips = vec![
            trip("Goa", 3),
            trip("Tokyo", 10),
            trip("Delhi", 1),
            trip("Paris", 5),
        ];
        for sort in [SortKey::None, SortKey::Name, SortKey::Days] {
            let query = TripQuery {
                day_filter: DayFilter::Short,
                sort,
                ..TripQuery::default()
            };
            let listed = apply_query(&trips, &query);
            let mut got = names(&listed);
            got.sort_unstable();
            assert_eq!(got, ["Delhi", "Goa"], "sort {sort}");
            assert!(listed.iter().all(|l| l.trip.days <= 3));
        }
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let trips = vec![trip("New Delhi", 2), trip("Paris", 2), trip("delft", 2)];
        let query = TripQuery {
            search: "DEL".to_owned(),
            ..TripQuery::default()
        };
        assert_eq!(names(&apply_query(&trips, &query)), ["New Delhi", "delft"]);
    }

    #[test]
    fn positions_refer_to_stored_order() {
        let trips = vec![trip("Paris", 2), trip("Delhi", 2)];
        let query = TripQuery {
            sort: SortKey::Name,
            ..TripQuery::default()
        };
        let listed = apply_query(&trips, &query);
        assert_eq!(listed[0].position, 1);
        assert_eq!(listed[1].position, 0);
        // Input untouched.
        assert_eq!(trips[0].destination, "Paris");
    }

    #[test]
    fn summary_totals() {
        let trips = vec![trip("Goa", 3), trip("Tokyo", 10)];
        let listed = apply_query(&trips, &TripQuery::default());
        let summary = TripSummary::of(&listed);
        assert_eq!(summary.total_trips, 2);
        assert_eq!(summary.total_days, 13);
        assert_eq!(summary.total_estimated_budget, 130.0);
        assert_eq!(summary.to_string(), "Total trips: 2 | Total days: 13");
    }

    #[test]
    fn parse_filters_and_sorts() {
        assert_eq!("medium".parse::<DayFilter>().unwrap(), DayFilter::Medium);
        assert_eq!("days".parse::<SortKey>().unwrap(), SortKey::Days);
        assert!(matches!(
            "huge".parse::<DayFilter>(),
            Err(QueryParseError::DayFilter(_))
        ));
        assert!(matches!(
            "price".parse::<SortKey>(),
            Err(QueryParseError::SortKey(_))
        ));
    }

    #[test]
    fn next_cycles_back_to_start() {
        let mut f = DayFilter::All;
        for _ in 0..4 {
            f = f.next();
        }
        assert_eq!(f, DayFilter::All);
        assert_eq!(SortKey::Days.next(), SortKey::None);
    }
}
