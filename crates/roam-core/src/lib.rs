//! Domain logic for roam: trips, feedback, the itinerary planner, place
//! search, plan suggestions, the planning relay and printable export.

pub mod events;
pub mod export;
pub mod feedback;
pub mod itinerary;
pub mod places;
pub mod relay;
pub mod suggest;
pub mod trip;

pub use events::{ChangeEvent, EventBus};
