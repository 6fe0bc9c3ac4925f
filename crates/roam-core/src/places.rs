//! Place search and the static "top attractions" table.
//!
//! There is no places API behind this; search returns a fixed set of
//! example results built from the query.

use serde::{Deserialize, Serialize};

/// A search result that can be added to an itinerary day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Place {
    pub id: String,
    pub name: String,
}

const EXAMPLE_LANDMARKS: [&str; 3] = ["Tokyo Tower", "Sushi Joint", "Shinjuku Garden"];

/// Simulated place search. An empty query returns nothing.
pub fn search_places(query: &str) -> Vec<Place> {
    if query.is_empty() {
        return Vec::new();
    }
    EXAMPLE_LANDMARKS
        .iter()
        .enumerate()
        .map(|(i, landmark)| Place {
            id: format!("place{}", i + 1),
            name: format!("{query} Example {} ({landmark})", i + 1),
        })
        .collect()
}

const ATTRACTIONS: &[(&str, &[&str])] = &[
    ("Paris", &["Eiffel Tower", "Louvre Museum", "Notre Dame Cathedral"]),
    ("London", &["Big Ben", "London Eye", "Buckingham Palace"]),
    ("Tokyo", &["Tokyo Tower", "Shibuya Crossing", "Senso-ji Temple"]),
    ("Delhi", &["Red Fort", "Qutub Minar", "India Gate"]),
];

/// Top attractions for a city (exact name after trimming), or an empty
/// slice when the city is not in the table.
pub fn top_attractions(city: &str) -> &'static [&'static str] {
    let city = city.trim();
    ATTRACTIONS
        .iter()
        .find(|(name, _)| *name == city)
        .map(|(_, list)| *list)
        .unwrap_or(&[])
}
