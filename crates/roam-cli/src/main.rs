mod config;
mod export_cmd;
mod feedback_cmds;
mod planner_cmd;
mod serve_cmd;
mod trip_cmds;
mod tui;

#[cfg(test)]
mod test_util;

use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use roam_core::EventBus;
use roam_core::places::top_attractions;
use roam_core::trip::{DayFilter, SortKey};
use roam_db::config::BackendKind;
use roam_db::store::{PgStore, open_store};

use config::{RelayOverrides, RoamConfig, StorageOverrides};

#[derive(Parser)]
#[command(name = "roam", about = "Trip planner: trips, itineraries, feedback and a planning relay")]
struct Cli {
    /// Storage backend: file, postgres or memory (overrides ROAM_STORAGE)
    #[arg(long, global = true)]
    backend: Option<BackendKind>,

    /// JSON data file for the file backend (overrides ROAM_DATA_FILE)
    #[arg(long, global = true)]
    data_file: Option<PathBuf>,

    /// Database URL (overrides ROAM_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn storage_overrides(&self) -> StorageOverrides {
        StorageOverrides {
            backend: self.backend,
            data_file: self.data_file.clone(),
            database_url: self.database_url.clone(),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a roam config file (uses --backend and --data-file)
    Init {
        /// PostgreSQL connection URL
        #[arg(long)]
        db_url: Option<String>,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Create the PostgreSQL database and run migrations
    DbInit,
    /// Manage saved trips
    Trip {
        #[command(subcommand)]
        command: TripCommands,
    },
    /// Submit or read visitor feedback
    Feedback {
        #[command(subcommand)]
        command: FeedbackCommands,
    },
    /// Show the top attractions of a city
    Attractions {
        /// City name, e.g. Paris
        city: String,
    },
    /// Write all trips as a printable HTML document
    Export {
        /// Output file path (defaults to stdout)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Interactive day-by-day itinerary planner
    Plan,
    /// Generate a trip plan from JSON on stdin (planner process for `serve`)
    Suggest,
    /// Run the planning relay HTTP server
    Serve {
        /// Address to bind
        #[arg(long)]
        bind: Option<String>,
        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,
        /// Planner program (defaults to `roam suggest`)
        #[arg(long)]
        command: Option<String>,
        /// Argument for the planner program (repeatable, needs a command)
        #[arg(long = "arg", allow_hyphen_values = true)]
        args: Vec<String>,
        /// Kill the planner after this many seconds (0 = never)
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// Launch interactive TUI dashboard
    Dashboard,
    /// Print shell completions
    Completions {
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum TripCommands {
    /// Save a new trip
    Add {
        #[arg(long)]
        destination: String,
        /// Trip length in days
        #[arg(long)]
        days: u32,
        #[arg(long)]
        notes: Option<String>,
        /// Budget per day
        #[arg(long, default_value_t = 0.0)]
        budget: f64,
        /// Image reference (URL or data URL)
        #[arg(long)]
        image: Option<String>,
    },
    /// List trips
    List {
        /// Case-insensitive destination search
        #[arg(long, default_value = "")]
        search: String,
        /// all, short (<=3 days), medium (4-7) or long (>7)
        #[arg(long, default_value_t = DayFilter::All)]
        filter: DayFilter,
        /// none, name or days
        #[arg(long, default_value_t = SortKey::None)]
        sort: SortKey,
    },
    /// Show one trip
    Show {
        /// Trip ID or unique prefix
        id: String,
    },
    /// Change fields of a trip
    Edit {
        /// Trip ID or unique prefix
        id: String,
        #[arg(long)]
        destination: Option<String>,
        #[arg(long)]
        days: Option<u32>,
        #[arg(long, conflicts_with = "clear_notes")]
        notes: Option<String>,
        #[arg(long)]
        clear_notes: bool,
        #[arg(long)]
        budget: Option<f64>,
        #[arg(long, conflicts_with = "clear_image")]
        image: Option<String>,
        #[arg(long)]
        clear_image: bool,
    },
    /// Delete a trip
    Delete {
        /// Trip ID or unique prefix
        id: String,
        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Toggle the visited flag
    Visit {
        /// Trip ID or unique prefix
        id: String,
    },
}

#[derive(Subcommand)]
pub enum FeedbackCommands {
    /// Submit feedback
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        message: String,
    },
    /// List all feedback
    List,
}

/// Execute the `roam init` command: write config file.
fn cmd_init(overrides: StorageOverrides, db_url: Option<String>, force: bool) -> anyhow::Result<()> {
    let config_path = config::config_path();

    if config_path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            config_path.display()
        );
    }

    let store = overrides.backend.unwrap_or_default();
    let db_url = db_url.or(overrides.database_url);
    let path = match store {
        BackendKind::File => Some(
            overrides
                .data_file
                .unwrap_or_else(roam_db::config::default_data_file),
        ),
        _ => overrides.data_file,
    };
    let cfg = config::ConfigFile {
        storage: config::StorageSection {
            backend: store,
            path: path.clone(),
            database_url: db_url.clone(),
        },
        relay: config::RelaySection::default(),
    };
    config::save_config_to(&cfg, &config_path)?;

    println!("Config written to {}", config_path.display());
    println!("  storage.backend = {store}");
    if let Some(path) = &path {
        println!("  storage.path = {}", path.display());
    }
    if let Some(url) = &db_url {
        println!("  storage.database_url = {url}");
    }
    if store == BackendKind::Postgres {
        println!();
        println!("Next: run `roam db-init` to create and migrate the database.");
    }

    Ok(())
}

/// Execute the `roam db-init` command: create database and run migrations.
async fn cmd_db_init(overrides: &StorageOverrides) -> anyhow::Result<()> {
    let resolved = RoamConfig::resolve(overrides)?;
    let db_config = resolved.postgres(overrides);

    println!("Initializing roam database...");

    let store = PgStore::provision(&db_config).await?;

    let versions = store.key_versions().await?;
    if versions.is_empty() {
        println!("Database ready. No collections stored yet.");
    } else {
        println!("Database ready. Collections:");
        for (key, version) in &versions {
            println!("  {key}: version {version}");
        }
    }

    store.close().await;

    println!("roam db-init complete.");
    Ok(())
}

fn cmd_attractions(city: &str) {
    let attractions = top_attractions(city);
    if attractions.is_empty() {
        println!("No data for this city.");
        return;
    }
    println!("Top attractions in {}:", city.trim());
    for name in attractions {
        println!("  - {name}");
    }
}

fn cmd_suggest() -> anyhow::Result<()> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("failed to read planning request from stdin")?;
    let plan = roam_core::suggest::plan_from_json(&input, &mut rand::rng());
    println!("{plan}");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let overrides = cli.storage_overrides();

    match cli.command {
        Commands::Init { db_url, force } => {
            cmd_init(overrides, db_url, force)?;
        }
        Commands::DbInit => {
            cmd_db_init(&overrides).await?;
        }
        Commands::Trip { command } => {
            let resolved = RoamConfig::resolve(&overrides)?;
            let store = open_store(&resolved.storage).await?;
            trip_cmds::run_trip_command(command, store, EventBus::new()).await?;
        }
        Commands::Feedback { command } => {
            let resolved = RoamConfig::resolve(&overrides)?;
            let store = open_store(&resolved.storage).await?;
            feedback_cmds::run_feedback_command(command, store, EventBus::new()).await?;
        }
        Commands::Attractions { city } => {
            cmd_attractions(&city);
        }
        Commands::Export { output } => {
            let resolved = RoamConfig::resolve(&overrides)?;
            let store = open_store(&resolved.storage).await?;
            export_cmd::run_export(store, output.as_deref()).await?;
        }
        Commands::Plan => {
            let stdin = std::io::stdin();
            let stdout = std::io::stdout();
            planner_cmd::run_planner_session(stdin.lock(), stdout.lock(), EventBus::new())?;
        }
        Commands::Suggest => {
            cmd_suggest()?;
        }
        Commands::Serve {
            bind,
            port,
            command,
            args,
            timeout_secs,
        } => {
            let resolved = RoamConfig::resolve(&overrides)?;
            let relay = resolved.relay(&RelayOverrides {
                bind,
                port,
                command,
                args,
                timeout_secs,
            })?;
            serve_cmd::run_serve(relay).await?;
        }
        Commands::Dashboard => {
            let resolved = RoamConfig::resolve(&overrides)?;
            let store = open_store(&resolved.storage).await?;
            tui::run_dashboard(store).await?;
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "roam", &mut std::io::stdout());
        }
    }

    Ok(())
}
