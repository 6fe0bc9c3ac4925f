//! Built-in planning process: budget split, a sampled day-by-day
//! itinerary and travel suggestions for a destination.
//!
//! `roam suggest` reads a [`PlanRequest`] as JSON on stdin and prints a
//! [`TripPlan`], or `{"error": "..."}` when the request is unusable.

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

pub const DEFAULT_DESTINATION: &str = "Unknown";
pub const DEFAULT_DAYS: i64 = 1;
pub const DEFAULT_BUDGET: i64 = 10_000;

/// Longest itinerary the planner will generate.
pub const MAX_PLAN_DAYS: i64 = 365;

const ACTIVITIES_PER_DAY: usize = 3;

const PLACES: &[(&str, [&str; 5])] = &[
    (
        "Goa",
        ["Baga Beach", "Fort Aguada", "Dudhsagar Falls", "Anjuna Market", "Old Goa Churches"],
    ),
    (
        "Delhi",
        ["Red Fort", "India Gate", "Qutub Minar", "Lotus Temple", "Chandni Chowk"],
    ),
    (
        "Paris",
        ["Eiffel Tower", "Louvre Museum", "Notre Dame", "Seine River Cruise", "Montmartre"],
    ),
    (
        "Tokyo",
        ["Shibuya Crossing", "Tokyo Tower", "Asakusa Temple", "Akihabara", "Meiji Shrine"],
    ),
];

const FALLBACK_PLACES: [&str; 5] = [
    "Local attractions",
    "Nearby markets",
    "Cultural center",
    "Parks",
    "Museums",
];

const NOTES: [&str; 5] = [
    "Enjoy local food and take plenty of photos!",
    "Try to experience the nightlife and local culture.",
    "Plan an early start to cover more attractions.",
    "Spend time exploring lesser-known areas.",
    "Buy souvenirs and support local artisans.",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("invalid JSON: {0}")]
    Json(String),

    #[error("request must be a JSON object")]
    NotAnObject,

    #[error("invalid literal for int() with base 10: {field} = {value}")]
    NotAnInteger { field: &'static str, value: String },

    #[error("days must be at most {}", MAX_PLAN_DAYS)]
    TooManyDays,
}

/// A planning request after loose field coercion.
///
/// `destination` is kept as given, whatever its JSON type; only a string
/// can select a known place list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanRequest {
    pub destination: Value,
    pub days: i64,
    pub budget: i64,
}

impl Default for PlanRequest {
    fn default() -> Self {
        Self {
            destination: Value::from(DEFAULT_DESTINATION),
            days: DEFAULT_DAYS,
            budget: DEFAULT_BUDGET,
        }
    }
}

impl PlanRequest {
    /// Read a request from arbitrary JSON. Missing fields take their
    /// defaults. `days` and `budget` may be numbers, numeric strings or
    /// booleans (fractions are truncated); an explicit `null` is an error.
    pub fn from_value(value: &Value) -> Result<Self, PlanError> {
        let obj = value.as_object().ok_or(PlanError::NotAnObject)?;
        let mut req = Self::default();

        if let Some(v) = obj.get("destination") {
            req.destination = v.clone();
        }
        if let Some(v) = obj.get("days") {
            req.days = loose_int("days", v)?;
        }
        if let Some(v) = obj.get("budget") {
            req.budget = loose_int("budget", v)?;
        }
        if req.days > MAX_PLAN_DAYS {
            return Err(PlanError::TooManyDays);
        }
        Ok(req)
    }
}

fn loose_int(field: &'static str, value: &Value) -> Result<i64, PlanError> {
    let bad = || PlanError::NotAnInteger {
        field,
        value: value.to_string(),
    };
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .ok_or_else(bad),
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| bad()),
        Value::Bool(b) => Ok(i64::from(*b)),
        _ => Err(bad()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Allocation {
    pub stay: i64,
    pub food: i64,
    pub travel: i64,
    pub misc: i64,
}

impl Allocation {
    /// 40/30/20/10 split, each share rounded half-to-even.
    pub fn split(budget: i64) -> Self {
        let share = |pct: f64| (budget as f64 * pct).round_ties_even() as i64;
        Self {
            stay: share(0.4),
            food: share(0.3),
            travel: share(0.2),
            misc: share(0.1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayPlan {
    pub day: i64,
    pub activities: Vec<String>,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TripPlan {
    pub destination: Value,
    pub days: i64,
    pub total_budget: i64,
    pub allocation: Allocation,
    pub itinerary: Vec<DayPlan>,
    pub suggestions: Vec<String>,
}

/// Candidate activities for a destination (exact match, else the
/// generic list).
pub fn places_for(destination: &str) -> &'static [&'static str] {
    PLACES
        .iter()
        .find(|(name, _)| *name == destination)
        .map(|(_, places)| places.as_slice())
        .unwrap_or(&FALLBACK_PLACES)
}

/// How a destination reads inside a sentence: strings as-is, anything
/// else as its JSON text.
fn destination_label(destination: &Value) -> String {
    match destination {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn suggestions(destination: &str) -> Vec<String> {
    vec![
        format!("Book stays near city center of {destination} to save travel time."),
        format!("Use public transport or rent bikes for easy movement in {destination}."),
        format!("Try local street food for an authentic experience in {destination}."),
        "Plan your travel during off-season to get better deals.".to_owned(),
    ]
}

/// Build a plan. A non-positive day count yields an empty itinerary.
pub fn generate_plan<R: Rng + ?Sized>(req: &PlanRequest, rng: &mut R) -> TripPlan {
    let places = req
        .destination
        .as_str()
        .map(places_for)
        .unwrap_or(&FALLBACK_PLACES);
    let itinerary = (1..=req.days)
        .map(|day| DayPlan {
            day,
            activities: places
                .choose_multiple(rng, ACTIVITIES_PER_DAY)
                .map(|s| (*s).to_owned())
                .collect(),
            note: NOTES.choose(rng).copied().unwrap_or_default().to_owned(),
        })
        .collect();

    TripPlan {
        destination: req.destination.clone(),
        days: req.days,
        total_budget: req.budget,
        allocation: Allocation::split(req.budget),
        itinerary,
        suggestions: suggestions(&destination_label(&req.destination)),
    }
}

/// Run the whole planning step on raw input text, returning the JSON
/// document to print. Never fails: errors become `{"error": ...}`.
pub fn plan_from_json<R: Rng + ?Sized>(input: &str, rng: &mut R) -> Value {
    let result = serde_json::from_str::<Value>(input)
        .map_err(|e| PlanError::Json(e.to_string()))
        .and_then(|v| PlanRequest::from_value(&v))
        .map(|req| generate_plan(&req, rng));

    match result.map(serde_json::to_value) {
        Ok(Ok(plan)) => plan,
        Ok(Err(e)) => serde_json::json!({ "error": e.to_string() }),
        Err(e) => {
            tracing::warn!(error = %e, "rejected planning request");
            serde_json::json!({ "error": e.to_string() })
        }
    }
}
