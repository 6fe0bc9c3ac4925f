use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Storage key holding the serialized trip collection.
pub const TRIPS_KEY: &str = "trips";

/// Storage key holding the serialized feedback collection.
pub const FEEDBACKS_KEY: &str = "feedbacks";

// ---------------------------------------------------------------------------
// Trips
// ---------------------------------------------------------------------------

/// A persisted entry describing one planned journey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub id: Uuid,
    pub destination: String,
    pub days: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Per-day budget.
    #[serde(default)]
    pub budget: f64,
    /// Opaque image reference (data URL or path). Never decoded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub visited: bool,
    pub created_at: DateTime<Utc>,
}

impl Trip {
    /// Estimated total spend: days times the per-day budget.
    pub fn estimated_budget(&self) -> f64 {
        f64::from(self.days) * self.budget
    }
}

/// Fields supplied when creating a trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewTrip {
    pub destination: String,
    pub days: u32,
    pub notes: Option<String>,
    pub budget: f64,
    pub image: Option<String>,
}

/// A partial update: `None` leaves the stored field untouched.
///
/// `notes` and `image` are doubly optional so they can be cleared with
/// `Some(None)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TripUpdate {
    pub destination: Option<String>,
    pub days: Option<u32>,
    pub notes: Option<Option<String>>,
    pub budget: Option<f64>,
    pub image: Option<Option<String>>,
}

impl TripUpdate {
    pub fn is_empty(&self) -> bool {
        self.destination.is_none()
            && self.days.is_none()
            && self.notes.is_none()
            && self.budget.is_none()
            && self.image.is_none()
    }

    /// Overwrite the provided fields on `trip`.
    pub fn apply_to(&self, trip: &mut Trip) {
        if let Some(ref destination) = self.destination {
            trip.destination = destination.clone();
        }
        if let Some(days) = self.days {
            trip.days = days;
        }
        if let Some(ref notes) = self.notes {
            trip.notes = notes.clone();
        }
        if let Some(budget) = self.budget {
            trip.budget = budget;
        }
        if let Some(ref image) = self.image {
            trip.image = image.clone();
        }
    }
}

// ---------------------------------------------------------------------------
// Feedback
// ---------------------------------------------------------------------------

/// An append-only feedback entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    pub name: String,
    pub message: String,
    /// Submission date formatted as a locale date (`M/D/YYYY`).
    pub date: String,
    pub submitted_at: DateTime<Utc>,
}
