use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Connection settings for the PostgreSQL backend. The CLI decides the
/// URL (flag, `ROAM_DATABASE_URL`, config file, then [`DbConfig::DEFAULT_URL`]).
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Full PostgreSQL connection URL.
    pub database_url: String,
}

impl DbConfig {
    pub const DEFAULT_URL: &str = "postgresql://localhost:5432/roam";

    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
        }
    }

    /// Database name from the URL path, without query parameters. Used in
    /// log lines instead of the URL so credentials stay out of them.
    pub fn database_name(&self) -> Option<&str> {
        let without_query = self.database_url.split('?').next().unwrap_or_default();
        without_query
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty() && !s.contains(':') && !s.contains('@'))
    }
}

// ---------------------------------------------------------------------------
// Backend selection
// ---------------------------------------------------------------------------

/// Which key-value backend holds the `trips` / `feedbacks` collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// A single JSON document on disk.
    #[default]
    File,
    /// The `kv_entries` table in PostgreSQL.
    Postgres,
    /// Process-local, lost on exit.
    Memory,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::File => "file",
            Self::Postgres => "postgres",
            Self::Memory => "memory",
        };
        f.write_str(s)
    }
}

impl FromStr for BackendKind {
    type Err = BackendKindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file" => Ok(Self::File),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(BackendKindParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`BackendKind`] string.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid storage backend {0:?} (expected file, postgres, or memory)")]
pub struct BackendKindParseError(pub String);

/// Fully resolved storage configuration.
#[derive(Debug, Clone)]
pub enum StorageConfig {
    File { path: PathBuf },
    Postgres(DbConfig),
    Memory,
}

/// Default location of the JSON data file.
///
/// `$XDG_DATA_HOME/roam/store.json`, else `~/.local/share/roam/store.json`.
pub fn default_data_file() -> PathBuf {
    if let Ok(xdg) = env::var("XDG_DATA_HOME") {
        return PathBuf::from(xdg).join("roam").join("store.json");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".local")
        .join("share")
        .join("roam")
        .join("store.json")
}
