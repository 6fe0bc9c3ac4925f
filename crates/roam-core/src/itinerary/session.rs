use crate::events::{ChangeEvent, EventBus};
use crate::places::{Place, search_places};

use super::dates::parse_optional_date;
use super::{ActiveTrip, ItineraryError, ItineraryItem, Planner};

/// One planning session: the login flag, the planner and the most recent
/// search results.
#[derive(Debug)]
pub struct Session {
    logged_in: bool,
    planner: Planner,
    last_results: Vec<Place>,
    events: EventBus,
}

impl Session {
    pub fn new(events: EventBus) -> Self {
        Self {
            logged_in: false,
            planner: Planner::new(),
            last_results: Vec::new(),
            events,
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    pub fn planner(&self) -> &Planner {
        &self.planner
    }

    pub fn last_results(&self) -> &[Place] {
        &self.last_results
    }

    pub fn login(&mut self) {
        self.logged_in = true;
    }

    /// Log out and drop the current itinerary.
    pub fn logout(&mut self) {
        let had_trip = self.planner.active().is_some();
        self.logged_in = false;
        self.planner.reset();
        self.last_results.clear();
        if had_trip {
            self.events.emit(ChangeEvent::ItineraryCleared);
        }
    }

    /// Flip the login flag. Returns the new state.
    pub fn toggle_login(&mut self) -> bool {
        if self.logged_in {
            self.logout();
        } else {
            self.login();
        }
        self.logged_in
    }

    fn require_login(&self) -> Result<(), ItineraryError> {
        if self.logged_in {
            Ok(())
        } else {
            Err(ItineraryError::NotLoggedIn)
        }
    }

    fn require_trip(&self) -> Result<(), ItineraryError> {
        self.require_login()?;
        if self.planner.active().is_none() {
            return Err(ItineraryError::NoActiveTrip);
        }
        Ok(())
    }

    /// Start a new trip from raw `YYYY-MM-DD` inputs. Blank dates count
    /// as missing.
    pub fn create_trip(
        &mut self,
        destination: &str,
        start: &str,
        end: &str,
    ) -> Result<&ActiveTrip, ItineraryError> {
        self.require_login()?;
        let start = parse_optional_date(start)?;
        let end = parse_optional_date(end)?;

        let trip = self.planner.start_trip(destination, start, end)?;
        self.last_results.clear();
        tracing::info!(destination = %trip.destination, num_days = trip.num_days, "trip started");
        self.events.emit(ChangeEvent::ItineraryStarted {
            destination: trip.destination.clone(),
            num_days: trip.num_days,
        });
        Ok(trip)
    }

    /// Search for places and remember the results for `add_result`.
    pub fn search(&mut self, query: &str) -> Result<&[Place], ItineraryError> {
        self.require_trip()?;
        self.last_results = search_places(query.trim());
        Ok(self.last_results.as_slice())
    }

    /// Add search result number `result` (1-based) to `day`.
    pub fn add_result(&mut self, day: u32, result: usize) -> Result<ItineraryItem, ItineraryError> {
        self.require_trip()?;
        let place = result
            .checked_sub(1)
            .and_then(|i| self.last_results.get(i))
            .ok_or(ItineraryError::NoSuchResult(result))?;
        let item = ItineraryItem {
            id: place.id.clone(),
            name: place.name.clone(),
        };
        self.add_item(day, item.clone())?;
        Ok(item)
    }

    pub fn add_item(&mut self, day: u32, item: ItineraryItem) -> Result<(), ItineraryError> {
        self.require_trip()?;
        self.planner.add_item(day, item)?;
        self.events.emit(ChangeEvent::ItineraryChanged { day });
        Ok(())
    }

    pub fn remove_item(&mut self, day: u32, index: usize) -> Result<ItineraryItem, ItineraryError> {
        self.require_trip()?;
        let removed = self.planner.remove_item(day, index)?;
        self.events.emit(ChangeEvent::ItineraryChanged { day });
        Ok(removed)
    }

    pub fn remove_item_by_id(&mut self, day: u32, id: &str) -> Result<ItineraryItem, ItineraryError> {
        self.require_trip()?;
        let removed = self.planner.remove_item_by_id(day, id)?;
        self.events.emit(ChangeEvent::ItineraryChanged { day });
        Ok(removed)
    }
}
