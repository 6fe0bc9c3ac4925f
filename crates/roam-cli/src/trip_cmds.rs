//! CLI handlers for `roam trip` subcommands.
//!
//! Implements:
//! - `roam trip add`          -- save a new trip
//! - `roam trip list`         -- filtered, sorted table with totals
//! - `roam trip show <id>`    -- one trip in detail
//! - `roam trip edit <id>`    -- change fields
//! - `roam trip delete <id>`  -- remove after confirmation
//! - `roam trip visit <id>`   -- toggle the visited flag

use std::io::{BufRead, Write};
use std::sync::Arc;

use anyhow::Result;

use roam_core::EventBus;
use roam_core::trip::{ListedTrip, TripQuery, TripRepository, TripSummary};
use roam_db::KvStore;
use roam_db::models::{NewTrip, Trip, TripUpdate};

use crate::TripCommands;

// -----------------------------------------------------------------------
// Public entry point
// -----------------------------------------------------------------------

pub async fn run_trip_command(
    command: TripCommands,
    store: Arc<dyn KvStore>,
    events: EventBus,
) -> Result<()> {
    let repo = TripRepository::new(store, events);
    match command {
        TripCommands::Add {
            destination,
            days,
            notes,
            budget,
            image,
        } => {
            let new_trip = NewTrip {
                destination,
                days,
                notes,
                budget,
                image,
            };
            cmd_add(&repo, new_trip).await
        }
        TripCommands::List {
            search,
            filter,
            sort,
        } => {
            let query = TripQuery {
                search,
                day_filter: filter,
                sort,
            };
            cmd_list(&repo, &query).await
        }
        TripCommands::Show { id } => cmd_show(&repo, &id).await,
        TripCommands::Edit {
            id,
            destination,
            days,
            notes,
            clear_notes,
            budget,
            image,
            clear_image,
        } => {
            let update = TripUpdate {
                destination,
                days,
                notes: if clear_notes { Some(None) } else { notes.map(Some) },
                budget,
                image: if clear_image { Some(None) } else { image.map(Some) },
            };
            cmd_edit(&repo, &id, update).await
        }
        TripCommands::Delete { id, yes } => {
            let stdin = std::io::stdin();
            cmd_delete(&repo, &id, yes, &mut stdin.lock(), &mut std::io::stdout()).await
        }
        TripCommands::Visit { id } => cmd_visit(&repo, &id).await,
    }
}

// -----------------------------------------------------------------------
// Handlers
// -----------------------------------------------------------------------

async fn cmd_add(repo: &TripRepository, new_trip: NewTrip) -> Result<()> {
    let trip = repo.create(new_trip).await?;
    println!("Trip saved.");
    println!();
    println!("  ID:          {}", trip.id);
    println!("  Destination: {}", trip.destination);
    println!("  Days:        {}", trip.days);
    Ok(())
}

async fn cmd_list(repo: &TripRepository, query: &TripQuery) -> Result<()> {
    let listed = repo.list(query).await?;
    print!("{}", render_table(&listed));
    println!();
    println!("{}", TripSummary::of(&listed));
    Ok(())
}

async fn cmd_show(repo: &TripRepository, id: &str) -> Result<()> {
    let id = repo.resolve_id(id).await?;
    let trip = repo.get(id).await?;
    print!("{}", render_detail(&trip));
    Ok(())
}

async fn cmd_edit(repo: &TripRepository, id: &str, update: TripUpdate) -> Result<()> {
    let id = repo.resolve_id(id).await?;
    let trip = repo.update(id, update).await?;
    println!("Trip {} updated.", trip.id);
    print!("{}", render_detail(&trip));
    Ok(())
}

async fn cmd_delete<R: BufRead, W: Write>(
    repo: &TripRepository,
    id: &str,
    yes: bool,
    input: &mut R,
    output: &mut W,
) -> Result<()> {
    let id = repo.resolve_id(id).await?;
    let trip = repo.get(id).await?;

    if !yes && !confirm(&format!("Delete trip to {}?", trip.destination), input, output)? {
        writeln!(output, "Cancelled.")?;
        return Ok(());
    }

    repo.delete(id).await?;
    writeln!(output, "Deleted trip to {} ({id}).", trip.destination)?;
    Ok(())
}

async fn cmd_visit(repo: &TripRepository, id: &str) -> Result<()> {
    let id = repo.resolve_id(id).await?;
    let trip = repo.toggle_visited(id).await?;
    let state = if trip.visited { "visited" } else { "not visited" };
    println!("{} marked {state}.", trip.destination);
    Ok(())
}

/// Ask a yes/no question. Anything but `y`/`yes` is no.
pub fn confirm<R: BufRead, W: Write>(question: &str, input: &mut R, output: &mut W) -> Result<bool> {
    write!(output, "{question} [y/N] ")?;
    output.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

// -----------------------------------------------------------------------
// Rendering
// -----------------------------------------------------------------------

fn short_id(trip: &Trip) -> String {
    trip.id.simple().to_string()[..8].to_owned()
}

fn render_table(listed: &[ListedTrip]) -> String {
    if listed.is_empty() {
        return "No trips found. Use `roam trip add` to save one.\n".to_owned();
    }

    let id_w = 8;
    let dest_w = listed
        .iter()
        .map(|l| l.trip.destination.chars().count())
        .max()
        .unwrap_or(11)
        .max(11);
    let days_w = 4;
    let budget_w = 10;

    let mut out = format!(
        "{:>3}  {:<id_w$}  {:<dest_w$}  {:>days_w$}  {:>budget_w$}  VISITED\n",
        "#", "ID", "DESTINATION", "DAYS", "EST.BUDGET",
    );
    for l in listed {
        let visited = if l.trip.visited { "yes" } else { "no" };
        out.push_str(&format!(
            "{:>3}  {:<id_w$}  {:<dest_w$}  {:>days_w$}  {:>budget_w$.2}  {visited}\n",
            l.position + 1,
            short_id(&l.trip),
            l.trip.destination,
            l.trip.days,
            l.trip.estimated_budget(),
        ));
    }
    out
}

fn render_detail(trip: &Trip) -> String {
    let mut out = String::new();
    out.push_str(&format!("Trip: {}\n", trip.destination));
    out.push_str(&format!("  ID:          {}\n", trip.id));
    out.push_str(&format!("  Days:        {}\n", trip.days));
    out.push_str(&format!("  Budget/day:  {:.2}\n", trip.budget));
    out.push_str(&format!("  Estimated:   {:.2}\n", trip.estimated_budget()));
    out.push_str(&format!(
        "  Notes:       {}\n",
        trip.notes.as_deref().filter(|n| !n.is_empty()).unwrap_or("None")
    ));
    if let Some(image) = trip.image.as_deref() {
        out.push_str(&format!("  Image:       {image}\n"));
    }
    out.push_str(&format!(
        "  Visited:     {}\n",
        if trip.visited { "yes" } else { "no" }
    ));
    out.push_str(&format!(
        "  Created:     {}\n",
        trip.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use roam_core::trip::{DayFilter, SortKey};
    use roam_db::store::MemoryStore;

    fn repo() -> TripRepository {
        TripRepository::new(Arc::new(MemoryStore::new()), EventBus::new())
    }

    fn new_trip(destination: &str, days: u32) -> NewTrip {
        NewTrip {
            destination: destination.to_owned(),
            days,
            budget: 100.0,
            ..NewTrip::default()
        }
    }

    #[test]
    fn confirm_accepts_only_yes() {
        for (answer, expected) in [("y\n", true), ("YES\n", true), ("n\n", false), ("\n", false)] {
            let mut out = Vec::new();
            let got = confirm("Delete?", &mut answer.as_bytes(), &mut out).unwrap();
            assert_eq!(got, expected, "answer {answer:?}");
            assert_eq!(String::from_utf8(out).unwrap(), "Delete? [y/N] ");
        }
    }

    #[tokio::test]
    async fn declined_delete_keeps_trip() {
        let repo = repo();
        let trip = repo.create(new_trip("Goa", 3)).await.unwrap();

        let mut out = Vec::new();
        cmd_delete(&repo, &trip.id.to_string(), false, &mut "n\n".as_bytes(), &mut out)
            .await
            .unwrap();

        assert!(String::from_utf8(out).unwrap().contains("Cancelled."));
        assert_eq!(repo.all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn confirmed_delete_by_prefix() {
        let repo = repo();
        let trip = repo.create(new_trip("Goa", 3)).await.unwrap();
        let prefix = short_id(&trip);

        let mut out = Vec::new();
        cmd_delete(&repo, &prefix, false, &mut "y\n".as_bytes(), &mut out)
            .await
            .unwrap();

        assert!(String::from_utf8(out).unwrap().contains("Deleted trip to Goa"));
        assert!(repo.all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn table_shows_stored_positions_and_totals() {
        let repo = repo();
        for (dest, days) in [("Paris", 5), ("Delhi", 2), ("London", 3)] {
            repo.create(new_trip(dest, days)).await.unwrap();
        }
        let listed = repo
            .list(&TripQuery {
                day_filter: DayFilter::Short,
                sort: SortKey::Name,
                ..TripQuery::default()
            })
            .await
            .unwrap();

        let table = render_table(&listed);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].trim_start().starts_with("2 "));
        assert!(lines[1].contains("Delhi"));
        assert!(lines[1].contains("200.00"));
        assert!(lines[2].contains("London"));

        assert_eq!(
            TripSummary::of(&listed).to_string(),
            "Total trips: 2 | Total days: 5"
        );
    }

    #[test]
    fn empty_table_has_hint() {
        assert!(render_table(&[]).contains("roam trip add"));
    }

    #[test]
    fn detail_shows_none_for_missing_notes() {
        let trip = Trip {
            id: uuid::Uuid::new_v4(),
            destination: "Tokyo".to_owned(),
            days: 4,
            notes: None,
            budget: 250.0,
            image: None,
            visited: true,
            created_at: chrono::Utc::now(),
        };
        let detail = render_detail(&trip);
        assert!(detail.contains("Notes:       None"));
        assert!(detail.contains("Estimated:   1000.00"));
        assert!(detail.contains("Visited:     yes"));
    }
}
