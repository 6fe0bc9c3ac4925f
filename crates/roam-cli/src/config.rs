//! Configuration file management for roam.
//!
//! Provides a TOML-based config file at `~/.config/roam/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use roam_core::relay::PlannerCommand;
use roam_db::config::{BackendKind, DbConfig, StorageConfig, default_data_file};

pub const ENV_STORAGE: &str = "ROAM_STORAGE";
pub const ENV_DATA_FILE: &str = "ROAM_DATA_FILE";
pub const ENV_DATABASE_URL: &str = "ROAM_DATABASE_URL";

pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub storage: StorageSection,
    #[serde(default)]
    pub relay: RelaySection,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StorageSection {
    #[serde(default)]
    pub backend: BackendKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RelaySection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,
    /// 0 disables the timeout.
    #[serde(default)]
    pub timeout_secs: u64,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the roam config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/roam` or `~/.config/roam`.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("roam");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("roam")
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load the config file at `path`. A missing file is `Ok(None)`; a file
/// that exists but does not parse is an error.
pub fn load_config_from(path: &Path) -> Result<Option<ConfigFile>> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(e)
                .with_context(|| format!("failed to read config file at {}", path.display()));
        }
    };
    let config: ConfigFile = toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file at {}", path.display()))?;
    Ok(Some(config))
}

pub fn load_config() -> Result<Option<ConfigFile>> {
    load_config_from(&config_path())
}

/// Serialize and write the config file, creating parent dirs as needed.
pub fn save_config_to(config: &ConfigFile, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create config directory {}", dir.display()))?;
    }
    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;
    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Storage flags shared by every subcommand.
#[derive(Debug, Default, Clone)]
pub struct StorageOverrides {
    pub backend: Option<BackendKind>,
    pub data_file: Option<PathBuf>,
    pub database_url: Option<String>,
}

/// Flags of `roam serve`.
#[derive(Debug, Default, Clone)]
pub struct RelayOverrides {
    pub bind: Option<String>,
    pub port: Option<u16>,
    pub command: Option<String>,
    pub args: Vec<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct RelaySettings {
    pub bind: String,
    pub port: u16,
    pub planner: PlannerCommand,
}

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct RoamConfig {
    pub storage: StorageConfig,
    file: Option<ConfigFile>,
}

fn env_nonempty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl RoamConfig {
    /// Resolve against the config file in the default location.
    pub fn resolve(cli: &StorageOverrides) -> Result<Self> {
        Self::resolve_with(cli, load_config()?)
    }

    /// Resolve using the chain: CLI flag > env var > config file > default.
    ///
    /// - backend: `--backend` > `ROAM_STORAGE` > `storage.backend` > file
    /// - data file: `--data-file` > `ROAM_DATA_FILE` > `storage.path` > XDG data dir
    /// - DB URL: `--database-url` > `ROAM_DATABASE_URL` > `storage.database_url` > `DbConfig::DEFAULT_URL`
    pub fn resolve_with(cli: &StorageOverrides, file: Option<ConfigFile>) -> Result<Self> {
        let section = file.as_ref().map(|f| &f.storage);

        let backend = match (cli.backend, env_nonempty(ENV_STORAGE)) {
            (Some(kind), _) => kind,
            (None, Some(raw)) => raw
                .parse::<BackendKind>()
                .with_context(|| format!("{ENV_STORAGE} is not a valid backend"))?,
            (None, None) => section.map(|s| s.backend).unwrap_or_default(),
        };

        let storage = match backend {
            BackendKind::File => {
                let path = cli
                    .data_file
                    .clone()
                    .or_else(|| env_nonempty(ENV_DATA_FILE).map(PathBuf::from))
                    .or_else(|| section.and_then(|s| s.path.clone()))
                    .unwrap_or_else(default_data_file);
                StorageConfig::File { path }
            }
            BackendKind::Postgres => {
                let url = cli
                    .database_url
                    .clone()
                    .or_else(|| env_nonempty(ENV_DATABASE_URL))
                    .or_else(|| section.and_then(|s| s.database_url.clone()))
                    .unwrap_or_else(|| DbConfig::DEFAULT_URL.to_owned());
                StorageConfig::Postgres(DbConfig::new(url))
            }
            BackendKind::Memory => StorageConfig::Memory,
        };

        Ok(Self { storage, file })
    }

    /// The PostgreSQL settings regardless of the selected backend, for
    /// `db-init`.
    pub fn postgres(&self, cli: &StorageOverrides) -> DbConfig {
        if let StorageConfig::Postgres(db) = &self.storage {
            return db.clone();
        }
        let url = cli
            .database_url
            .clone()
            .or_else(|| env_nonempty(ENV_DATABASE_URL))
            .or_else(|| {
                self.file
                    .as_ref()
                    .and_then(|f| f.storage.database_url.clone())
            })
            .unwrap_or_else(|| DbConfig::DEFAULT_URL.to_owned());
        DbConfig::new(url)
    }

    /// Relay settings: CLI flag > config file > default. The default
    /// planner is this executable's own `suggest` subcommand, which takes
    /// no extra arguments.
    pub fn relay(&self, cli: &RelayOverrides) -> Result<RelaySettings> {
        let section = self.file.as_ref().map(|f| &f.relay);

        let bind = cli
            .bind
            .clone()
            .or_else(|| section.and_then(|s| s.bind.clone()))
            .unwrap_or_else(|| DEFAULT_BIND.to_owned());
        let port = cli
            .port
            .or_else(|| section.and_then(|s| s.port))
            .unwrap_or(DEFAULT_PORT);

        let (program, args) = match cli
            .command
            .clone()
            .or_else(|| section.and_then(|s| s.command.clone()))
        {
            Some(program) => {
                let args = if !cli.args.is_empty() || cli.command.is_some() {
                    cli.args.clone()
                } else {
                    section.and_then(|s| s.args.clone()).unwrap_or_default()
                };
                (program, args)
            }
            None if !cli.args.is_empty() => {
                bail!("--arg needs --command (or relay.command in the config file)")
            }
            None => (self_program(), vec!["suggest".to_owned()]),
        };

        let timeout_secs = cli
            .timeout_secs
            .or_else(|| section.map(|s| s.timeout_secs))
            .unwrap_or(0);
        let timeout = (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs));

        Ok(RelaySettings {
            bind,
            port,
            planner: PlannerCommand::new(program, args).with_timeout(timeout),
        })
    }
}

fn self_program() -> String {
    std::env::current_exe()
        .ok()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|| "roam".to_owned())
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        crate::test_util::lock_env()
    }

    fn clear_env() {
        for name in [ENV_STORAGE, ENV_DATA_FILE, ENV_DATABASE_URL] {
            unsafe { std::env::remove_var(name) };
        }
    }

    fn file_config() -> ConfigFile {
        ConfigFile {
            storage: StorageSection {
                backend: BackendKind::Postgres,
                path: Some(PathBuf::from("/srv/roam/store.json")),
                database_url: Some("postgresql://file:5432/filedb".to_owned()),
            },
            relay: RelaySection {
                bind: Some("0.0.0.0".to_owned()),
                port: Some(8080),
                command: Some("python3".to_owned()),
                args: Some(vec!["app.py".to_owned()]),
                timeout_secs: 30,
            },
        }
    }

    #[test]
    fn save_and_load_config_roundtrip() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("roam").join("config.toml");

        save_config_to(&file_config(), &path).unwrap();
        let loaded = load_config_from(&path).unwrap().unwrap();

        assert_eq!(loaded.storage.backend, BackendKind::Postgres);
        assert_eq!(loaded.relay.port, Some(8080));
        assert_eq!(loaded.relay.args, Some(vec!["app.py".to_owned()]));
    }

    #[test]
    fn missing_file_is_none_and_garbage_is_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        assert!(load_config_from(&path).unwrap().is_none());

        std::fs::write(&path, "storage = 5").unwrap();
        assert!(load_config_from(&path).is_err());
    }

    #[test]
    fn partial_file_takes_defaults() {
        let cfg: ConfigFile = toml::from_str("[relay]\nport = 9000\n").unwrap();
        assert_eq!(cfg.storage.backend, BackendKind::File);
        assert_eq!(cfg.relay.port, Some(9000));
        assert_eq!(cfg.relay.timeout_secs, 0);
    }

    #[test]
    fn cli_flag_overrides_all() {
        let _lock = lock_env();
        clear_env();
        unsafe { std::env::set_var(ENV_STORAGE, "memory") };
        unsafe { std::env::set_var(ENV_DATABASE_URL, "postgresql://env:5432/envdb") };

        let cli = StorageOverrides {
            backend: Some(BackendKind::Postgres),
            database_url: Some("postgresql://cli:5432/clidb".to_owned()),
            ..StorageOverrides::default()
        };
        let config = RoamConfig::resolve_with(&cli, Some(file_config())).unwrap();
        clear_env();

        match config.storage {
            StorageConfig::Postgres(db) => {
                assert_eq!(db.database_url, "postgresql://cli:5432/clidb")
            }
            other => panic!("expected postgres, got {other:?}"),
        }
    }

    #[test]
    fn env_var_overrides_config_file() {
        let _lock = lock_env();
        clear_env();
        unsafe { std::env::set_var(ENV_STORAGE, "file") };
        unsafe { std::env::set_var(ENV_DATA_FILE, "/tmp/env-store.json") };

        let config =
            RoamConfig::resolve_with(&StorageOverrides::default(), Some(file_config())).unwrap();
        clear_env();

        match config.storage {
            StorageConfig::File { path } => assert_eq!(path, PathBuf::from("/tmp/env-store.json")),
            other => panic!("expected file, got {other:?}"),
        }
    }

    #[test]
    fn config_file_used_when_no_flag_or_env() {
        let _lock = lock_env();
        clear_env();

        let config =
            RoamConfig::resolve_with(&StorageOverrides::default(), Some(file_config())).unwrap();
        assert!(
            matches!(config.storage, StorageConfig::Postgres(_)),
            "got {:?}",
            config.storage
        );
    }

    #[test]
    fn defaults_to_file_backend() {
        let _lock = lock_env();
        clear_env();

        let config = RoamConfig::resolve_with(&StorageOverrides::default(), None).unwrap();
        match config.storage {
            StorageConfig::File { path } => assert!(path.ends_with("roam/store.json")),
            other => panic!("expected file, got {other:?}"),
        }
    }

    #[test]
    fn bad_backend_env_is_an_error() {
        let _lock = lock_env();
        clear_env();
        unsafe { std::env::set_var(ENV_STORAGE, "redis") };

        let result = RoamConfig::resolve_with(&StorageOverrides::default(), None);
        clear_env();
        assert!(result.is_err());
    }

    #[test]
    fn relay_defaults_to_own_suggest() {
        let _lock = lock_env();
        clear_env();
        let config = RoamConfig::resolve_with(&StorageOverrides::default(), None).unwrap();

        let relay = config.relay(&RelayOverrides::default()).unwrap();
        assert_eq!(relay.bind, DEFAULT_BIND);
        assert_eq!(relay.port, DEFAULT_PORT);
        assert_eq!(relay.planner.args, ["suggest"]);
        assert_eq!(relay.planner.timeout, None);
    }

    #[test]
    fn relay_cli_command_drops_file_args() {
        let _lock = lock_env();
        clear_env();
        let config = RoamConfig::resolve_with(&StorageOverrides::default(), Some(file_config()))
            .unwrap();

        let from_file = config.relay(&RelayOverrides::default()).unwrap();
        assert_eq!(from_file.planner.program, "python3");
        assert_eq!(from_file.planner.args, ["app.py"]);
        assert_eq!(from_file.planner.timeout, Some(Duration::from_secs(30)));
        assert_eq!(from_file.port, 8080);

        let overridden = config.relay(&RelayOverrides {
            command: Some("cat".to_owned()),
            timeout_secs: Some(0),
            ..RelayOverrides::default()
        })
        .unwrap();
        assert_eq!(overridden.planner.program, "cat");
        assert!(overridden.planner.args.is_empty());
        assert_eq!(overridden.planner.timeout, None);
    }

    #[test]
    fn relay_args_without_any_command_are_rejected() {
        let _lock = lock_env();
        clear_env();
        let with_args = RelayOverrides {
            args: vec!["app.py".to_owned()],
            ..RelayOverrides::default()
        };

        let bare = RoamConfig::resolve_with(&StorageOverrides::default(), None).unwrap();
        let err = bare.relay(&with_args).unwrap_err();
        assert!(err.to_string().contains("--arg needs --command"), "got: {err}");

        // A command from the file takes the CLI args instead of its own.
        let from_file =
            RoamConfig::resolve_with(&StorageOverrides::default(), Some(file_config())).unwrap();
        let relay = from_file
            .relay(&RelayOverrides {
                args: vec!["other.py".to_owned()],
                ..RelayOverrides::default()
            })
            .unwrap();
        assert_eq!(relay.planner.program, "python3");
        assert_eq!(relay.planner.args, ["other.py"]);
    }

    #[test]
    fn config_path_ends_with_expected_filename() {
        let path = config_path();
        assert!(
            path.ends_with("roam/config.toml"),
            "unexpected config path: {}",
            path.display()
        );
    }
}
