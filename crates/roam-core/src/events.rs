//! Change notifications.
//!
//! Repositories and the planner session publish a [`ChangeEvent`] after
//! every successful mutation. Views subscribe and re-render; nothing in
//! the domain layer calls into presentation code.

use tokio::sync::broadcast;
use uuid::Uuid;

/// Capacity of the broadcast channel. Slow subscribers that fall further
/// behind than this see `RecvError::Lagged` and should simply reload.
const CHANNEL_CAPACITY: usize = 64;

/// A state change worth re-rendering for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    TripCreated { id: Uuid },
    TripUpdated { id: Uuid },
    TripDeleted { id: Uuid },
    VisitedToggled { id: Uuid, visited: bool },
    FeedbackSubmitted,
    ItineraryStarted { destination: String, num_days: u32 },
    ItineraryChanged { day: u32 },
    ItineraryCleared,
}

/// Fan-out channel for [`ChangeEvent`]s. Cheap to clone.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ChangeEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }

    /// Publish an event. Having no subscribers is not an error.
    pub fn emit(&self, event: ChangeEvent) {
        tracing::debug!(?event, "change event");
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
