//! TUI application state and key handling.

use std::time::Duration;

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::broadcast::Receiver;
use tokio::sync::broadcast::error::TryRecvError;
use uuid::Uuid;

use roam_core::ChangeEvent;
use roam_core::trip::{ListedTrip, TripQuery, TripRepository, TripSummary};
use roam_db::models::Trip;

/// What the keyboard currently drives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Browse,
    Search,
    ConfirmDelete(Uuid),
    Help,
}

pub struct App {
    repo: TripRepository,
    changes: Receiver<ChangeEvent>,
    pub mode: Mode,
    pub query: TripQuery,
    pub listed: Vec<ListedTrip>,
    pub summary: TripSummary,
    pub selected: usize,
    pub tick_rate: Duration,
    pub should_quit: bool,
    pub status_message: Option<String>,
}

impl App {
    pub fn new(repo: TripRepository) -> Self {
        let changes = repo.events().subscribe();
        Self {
            repo,
            changes,
            mode: Mode::Browse,
            query: TripQuery::default(),
            listed: Vec::new(),
            summary: TripSummary::default(),
            selected: 0,
            tick_rate: Duration::from_secs(1),
            should_quit: false,
            status_message: None,
        }
    }

    /// Reload the listing from storage.
    pub async fn refresh(&mut self) -> Result<()> {
        self.listed = self.repo.list(&self.query).await?;
        self.summary = TripSummary::of(&self.listed);
        if self.selected >= self.listed.len() {
            self.selected = self.listed.len().saturating_sub(1);
        }
        Ok(())
    }

    /// Consume pending change events. True when anything changed.
    pub fn drain_changes(&mut self) -> bool {
        let mut changed = false;
        loop {
            match self.changes.try_recv() {
                Ok(_) | Err(TryRecvError::Lagged(_)) => changed = true,
                Err(TryRecvError::Empty | TryRecvError::Closed) => return changed,
            }
        }
    }

    pub fn selected_trip(&self) -> Option<&Trip> {
        self.listed.get(self.selected).map(|l| &l.trip)
    }

    /// A listed trip by id, wherever the selection has moved since.
    pub fn trip(&self, id: Uuid) -> Option<&Trip> {
        self.listed.iter().map(|l| &l.trip).find(|t| t.id == id)
    }

    // -- Navigation --

    pub fn move_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        if self.selected + 1 < self.listed.len() {
            self.selected += 1;
        }
    }

    // -- Keys --

    pub async fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return Ok(());
        }

        match self.mode.clone() {
            Mode::Browse => self.handle_browse_key(key.code).await?,
            Mode::Search => self.handle_search_key(key.code).await?,
            Mode::ConfirmDelete(id) => self.handle_confirm_key(key.code, id).await?,
            Mode::Help => self.mode = Mode::Browse,
        }
        Ok(())
    }

    async fn handle_browse_key(&mut self, code: KeyCode) -> Result<()> {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('j') | KeyCode::Down => self.move_down(),
            KeyCode::Char('k') | KeyCode::Up => self.move_up(),
            KeyCode::Char('f') => {
                self.query.day_filter = self.query.day_filter.next();
                self.selected = 0;
                self.refresh().await?;
            }
            KeyCode::Char('s') => {
                self.query.sort = self.query.sort.next();
                self.refresh().await?;
            }
            KeyCode::Char('/') => self.mode = Mode::Search,
            KeyCode::Char('v') | KeyCode::Char(' ') => {
                if let Some(id) = self.selected_trip().map(|t| t.id) {
                    match self.repo.toggle_visited(id).await {
                        Ok(trip) => {
                            let state = if trip.visited { "visited" } else { "not visited" };
                            self.status_message =
                                Some(format!("{} marked {state}", trip.destination));
                        }
                        Err(e) => self.status_message = Some(format!("Toggle failed: {e}")),
                    }
                }
            }
            KeyCode::Char('d') => {
                if let Some(id) = self.selected_trip().map(|t| t.id) {
                    self.mode = Mode::ConfirmDelete(id);
                }
            }
            KeyCode::Char('r') => self.refresh().await?,
            KeyCode::Char('?') => self.mode = Mode::Help,
            _ => {}
        }
        Ok(())
    }

    async fn handle_search_key(&mut self, code: KeyCode) -> Result<()> {
        match code {
            KeyCode::Enter => self.mode = Mode::Browse,
            KeyCode::Esc => {
                self.query.search.clear();
                self.mode = Mode::Browse;
            }
            KeyCode::Backspace => {
                self.query.search.pop();
            }
            KeyCode::Char(c) => self.query.search.push(c),
            _ => return Ok(()),
        }
        self.selected = 0;
        self.refresh().await
    }

    async fn handle_confirm_key(&mut self, code: KeyCode, id: Uuid) -> Result<()> {
        match code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                self.mode = Mode::Browse;
                match self.repo.delete(id).await {
                    Ok(trip) => self.status_message = Some(format!("Deleted {}", trip.destination)),
                    Err(e) => self.status_message = Some(format!("Delete failed: {e}")),
                }
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.mode = Mode::Browse;
                self.status_message = Some("Delete cancelled".to_owned());
            }
            _ => {}
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
