//! `roam plan`: a line-oriented itinerary planner session.
//!
//! Errors from planner commands are printed and the session continues;
//! only I/O failures end it early.

use std::io::{BufRead, Write};

use anyhow::Result;

use roam_core::EventBus;
use roam_core::itinerary::{ItineraryError, Session};

const HELP: &str = "\
Commands:
  login                      log in
  logout                     log out and discard the itinerary
  new <destination> <start> <end>
                             start a trip (dates as YYYY-MM-DD)
  search <query>             search for places
  add <day> <result#>        add a search result to a day
  remove <day> <item#>       remove an item (numbers as shown by `show`)
  show                       print the itinerary
  help                       show this help
  quit                       leave the planner
";

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Login,
    Logout,
    New {
        destination: &'a str,
        start: &'a str,
        end: &'a str,
    },
    Search(&'a str),
    Add {
        day: u32,
        result: usize,
    },
    Remove {
        day: u32,
        item: usize,
    },
    Show,
    Help,
    Quit,
}

fn parse_number<T: std::str::FromStr>(what: &str, raw: Option<&str>) -> Result<T, String> {
    let raw = raw.ok_or_else(|| format!("missing {what}"))?;
    raw.parse()
        .map_err(|_| format!("{what} must be a positive number, got {raw:?}"))
}

fn parse_command(line: &str) -> Result<Command<'_>, String> {
    let line = line.trim();
    let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();

    match word {
        "login" => Ok(Command::Login),
        "logout" => Ok(Command::Logout),
        "new" => {
            let mut parts = rest.rsplitn(3, char::is_whitespace);
            let end = parts.next().unwrap_or_default();
            let start = parts.next().unwrap_or_default();
            let destination = parts.next().unwrap_or_default().trim();
            if destination.is_empty() {
                return Err("usage: new <destination> <start> <end>".to_owned());
            }
            Ok(Command::New {
                destination,
                start,
                end,
            })
        }
        "search" => Ok(Command::Search(rest)),
        "add" => {
            let mut parts = rest.split_whitespace();
            Ok(Command::Add {
                day: parse_number("day", parts.next())?,
                result: parse_number("result number", parts.next())?,
            })
        }
        "remove" => {
            let mut parts = rest.split_whitespace();
            Ok(Command::Remove {
                day: parse_number("day", parts.next())?,
                item: parse_number("item number", parts.next())?,
            })
        }
        "show" => Ok(Command::Show),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(format!("unknown command {other:?}; type `help`")),
    }
}

fn render_itinerary(session: &Session) -> String {
    let Some(trip) = session.planner().active() else {
        return "No active trip.\n".to_owned();
    };
    let mut out = format!(
        "{} ({} to {}, {} days)\n",
        trip.destination, trip.start, trip.end, trip.num_days
    );
    for (day, items) in session.planner().days() {
        out.push_str(&format!("Day {day}:\n"));
        if items.is_empty() {
            out.push_str("  (nothing planned)\n");
        }
        for (i, item) in items.iter().enumerate() {
            out.push_str(&format!("  {}. {}\n", i + 1, item.name));
        }
    }
    out
}

/// Report a planner error using the numbering the user typed.
fn describe_error(err: &ItineraryError) -> String {
    match err {
        ItineraryError::ItemOutOfRange { day, index, len } => {
            format!("day {day} has no item #{} ({len} items)", index + 1)
        }
        other => other.to_string(),
    }
}

/// Apply one command. Returns `Ok(false)` when the session should end.
fn execute<W: Write>(session: &mut Session, command: Command<'_>, out: &mut W) -> Result<bool> {
    let failure = match command {
        Command::Login => {
            session.login();
            writeln!(out, "Logged in.")?;
            None
        }
        Command::Logout => {
            session.logout();
            writeln!(out, "Logged out.")?;
            None
        }
        Command::New {
            destination,
            start,
            end,
        } => match session.create_trip(destination, start, end) {
            Ok(trip) => {
                writeln!(
                    out,
                    "Planning {} for {} days.",
                    trip.destination, trip.num_days
                )?;
                None
            }
            Err(e) => Some(e),
        },
        Command::Search(query) => match session.search(query) {
            Ok(results) => {
                if results.is_empty() {
                    writeln!(out, "No results.")?;
                }
                for (i, place) in results.iter().enumerate() {
                    writeln!(out, "  {}. {}", i + 1, place.name)?;
                }
                None
            }
            Err(e) => Some(e),
        },
        Command::Add { day, result } => match session.add_result(day, result) {
            Ok(item) => {
                writeln!(out, "Added {} to day {day}.", item.name)?;
                None
            }
            Err(e) => Some(e),
        },
        Command::Remove { item: 0, .. } => {
            writeln!(out, "error: item numbers start at 1")?;
            None
        }
        Command::Remove { day, item } => match session.remove_item(day, item - 1) {
            Ok(removed) => {
                writeln!(out, "Removed {} from day {day}.", removed.name)?;
                None
            }
            Err(e) => Some(e),
        },
        Command::Show => {
            write!(out, "{}", render_itinerary(session))?;
            None
        }
        Command::Help => {
            write!(out, "{HELP}")?;
            None
        }
        Command::Quit => return Ok(false),
    };

    if let Some(e) = failure {
        writeln!(out, "error: {}", describe_error(&e))?;
    }
    Ok(true)
}

/// Run the planner until `quit` or end of input.
pub fn run_planner_session<R: BufRead, W: Write>(
    mut input: R,
    mut output: W,
    events: EventBus,
) -> Result<()> {
    let mut session = Session::new(events);
    writeln!(output, "roam planner. Type `help` for commands.")?;

    let mut line = String::new();
    loop {
        write!(output, "roam> ")?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            break;
        }
        if line.trim().is_empty() {
            continue;
        }

        let keep_going = match parse_command(&line) {
            Ok(command) => execute(&mut session, command, &mut output)?,
            Err(msg) => {
                writeln!(output, "error: {msg}")?;
                true
            }
        };
        if !keep_going {
            break;
        }
    }
    Ok(())
}
