//! Interactive dashboard for browsing and managing saved trips.

pub mod app;
mod ui;

use std::io;
use std::sync::Arc;

use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use roam_core::EventBus;
use roam_core::trip::TripRepository;
use roam_db::KvStore;

use app::App;

/// Launch the dashboard.
pub async fn run_dashboard(store: Arc<dyn KvStore>) -> Result<()> {
    let mut app = App::new(TripRepository::new(store, EventBus::new()));
    app.refresh().await?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_event_loop(&mut terminal, &mut app).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    let tick_rate = app.tick_rate;

    loop {
        terminal.draw(|f| ui::render(f, app))?;

        if event::poll(tick_rate)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    app.status_message = None;
                    app.handle_key(key).await?;
                    if app.drain_changes() {
                        app.refresh().await?;
                    }
                }
                _ => {}
            }
        } else {
            // Tick: pick up writes from other processes.
            app.refresh().await?;
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
