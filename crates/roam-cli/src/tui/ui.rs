//! TUI rendering using ratatui.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table};

use super::app::{App, Mode};

pub fn render(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // query
            Constraint::Min(3),    // trips
            Constraint::Length(1), // status bar
        ])
        .split(f.area());

    render_query(f, app, chunks[0]);
    if app.mode == Mode::Help {
        render_help(f, chunks[1]);
    } else {
        render_trip_list(f, app, chunks[1]);
    }
    render_status_bar(f, app, chunks[2]);
}

fn render_query(f: &mut Frame, app: &App, area: Rect) {
    let label = Style::default().fg(Color::Yellow);
    let search_style = if app.mode == Mode::Search {
        Style::default().add_modifier(Modifier::UNDERLINED)
    } else {
        Style::default()
    };

    let line = Line::from(vec![
        Span::styled("Search: ", label),
        Span::styled(app.query.search.clone(), search_style),
        Span::raw("   "),
        Span::styled("Days: ", label),
        Span::raw(app.query.day_filter.to_string()),
        Span::raw("   "),
        Span::styled("Sort: ", label),
        Span::raw(app.query.sort.to_string()),
    ]);

    let block = Block::default().borders(Borders::ALL).title(" Query ");
    f.render_widget(Paragraph::new(line).block(block), area);
}

fn render_trip_list(f: &mut Frame, app: &App, area: Rect) {
    let header_cells = ["#", "Destination", "Days", "Budget/day", "Est. budget", "Visited"]
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow)));
    let header = Row::new(header_cells).height(1);

    let rows = app.listed.iter().enumerate().map(|(i, listed)| {
        let trip = &listed.trip;
        let style = if i == app.selected {
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };

        Row::new(vec![
            Cell::from((listed.position + 1).to_string()),
            Cell::from(trip.destination.clone()),
            Cell::from(trip.days.to_string()),
            Cell::from(format!("{:.0}", trip.budget)),
            Cell::from(format!("{:.0}", trip.estimated_budget())),
            Cell::from(visited_colored(trip.visited)),
        ])
        .style(style)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(4),
            Constraint::Percentage(35),
            Constraint::Length(6),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(8),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" Trips | {} ", app.summary)),
    );

    f.render_widget(table, area);
}

fn render_help(f: &mut Frame, area: Rect) {
    let heading = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);
    let text = vec![
        Line::from(""),
        Line::from(Span::styled("  Navigation", heading)),
        Line::from("    j/Down    Move down"),
        Line::from("    k/Up      Move up"),
        Line::from("    Esc/q     Quit"),
        Line::from(""),
        Line::from(Span::styled("  Listing", heading)),
        Line::from("    /         Search destinations (Enter keeps, Esc clears)"),
        Line::from("    f         Cycle day filter"),
        Line::from("    s         Cycle sort order"),
        Line::from("    r         Reload"),
        Line::from(""),
        Line::from(Span::styled("  Actions", heading)),
        Line::from("    v/Space   Toggle visited"),
        Line::from("    d         Delete selected trip"),
        Line::from(""),
    ];

    let help = Paragraph::new(text).block(Block::default().borders(Borders::ALL).title(" Help "));
    f.render_widget(help, area);
}

fn render_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let mode_name = match &app.mode {
        Mode::Browse => "Trips",
        Mode::Search => "Search",
        Mode::ConfirmDelete(_) => "Delete",
        Mode::Help => "Help",
    };

    let message = match &app.mode {
        Mode::ConfirmDelete(id) => Span::styled(
            format!(
                "Delete {}? (y/n)",
                app.trip(*id)
                    .map(|t| t.destination.as_str())
                    .unwrap_or("trip")
            ),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
        _ => Span::styled(
            app.status_message.clone().unwrap_or_default(),
            Style::default().fg(Color::Green),
        ),
    };

    let bar = Line::from(vec![
        Span::styled(
            format!(" {mode_name} "),
            Style::default().bg(Color::Blue).fg(Color::White),
        ),
        Span::raw("  "),
        message,
        Span::raw("  q:quit  ?:help  /:search  f:filter  s:sort"),
    ]);

    f.render_widget(Paragraph::new(bar), area);
}

fn visited_colored(visited: bool) -> Span<'static> {
    if visited {
        Span::styled("yes", Style::default().fg(Color::Green))
    } else {
        Span::styled("no", Style::default().fg(Color::DarkGray))
    }
}
