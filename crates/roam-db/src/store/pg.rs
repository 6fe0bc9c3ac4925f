use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::migrate::{MigrateDatabase, Migrator};
use sqlx::postgres::{PgPoolOptions, Postgres};

use super::{KvStore, Snapshot, StoreError};
use crate::config::DbConfig;

/// Schema for the `kv_entries` table, embedded from `migrations/`.
static MIGRATIONS: Migrator = sqlx::migrate!();

const MAX_CONNECTIONS: u32 = 5;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// Store backed by the `kv_entries` table.
///
/// The compare-and-swap is a single conditional `UPDATE` (or
/// `INSERT ... ON CONFLICT DO NOTHING` for the first write), so concurrent
/// writers from different processes are serialized by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Open a pool on an existing database and bring `kv_entries` up to date.
    pub async fn connect(config: &DbConfig) -> anyhow::Result<Self> {
        let db = config.database_name().unwrap_or("<unnamed>");
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(&config.database_url)
            .await
            .with_context(|| format!("cannot connect to database {db}"))?;
        MIGRATIONS
            .run(&pool)
            .await
            .with_context(|| format!("cannot migrate database {db}"))?;
        tracing::debug!(db, "postgres store ready");
        Ok(Self { pool })
    }

    /// Like [`connect`](Self::connect), but creates the database first when
    /// the server does not have it yet.
    pub async fn provision(config: &DbConfig) -> anyhow::Result<Self> {
        let url = config.database_url.as_str();
        let db = config.database_name().unwrap_or("<unnamed>");
        let exists = Postgres::database_exists(url)
            .await
            .with_context(|| format!("cannot check whether database {db} exists"))?;
        if !exists {
            Postgres::create_database(url)
                .await
                .with_context(|| format!("cannot create database {db}"))?;
            tracing::info!(db, "created database");
        }
        Self::connect(config).await
    }

    /// Current version of every stored key, in key order.
    pub async fn key_versions(&self) -> Result<Vec<(String, u64)>, StoreError> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT key, version FROM kv_entries ORDER BY key")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows
            .into_iter()
            .map(|(key, version)| (key, from_db_version(version)))
            .collect())
    }

    /// Close every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn current_version(&self, key: &str) -> Result<u64, StoreError> {
        let version: Option<i64> =
            sqlx::query_scalar("SELECT version FROM kv_entries WHERE key = $1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(version.map(from_db_version).unwrap_or(0))
    }
}

fn from_db_version(v: i64) -> u64 {
    u64::try_from(v).unwrap_or(0)
}

fn to_db_version(v: u64) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}

#[async_trait]
impl KvStore for PgStore {
    fn name(&self) -> &str {
        "postgres"
    }

    async fn get(&self, key: &str) -> Result<Snapshot, StoreError> {
        let row: Option<(i64, String)> =
            sqlx::query_as("SELECT version, value FROM kv_entries WHERE key = $1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        Ok(match row {
            Some((version, value)) => Snapshot {
                version: from_db_version(version),
                value: Some(value),
            },
            None => Snapshot::absent(),
        })
    }

    async fn put(
        &self,
        key: &str,
        value: String,
        expected_version: u64,
    ) -> Result<u64, StoreError> {
        let written: Option<i64> = if expected_version == 0 {
            sqlx::query_scalar(
                "INSERT INTO kv_entries (key, value, version) \
                 VALUES ($1, $2, 1) \
                 ON CONFLICT (key) DO NOTHING \
                 RETURNING version",
            )
            .bind(key)
            .bind(&value)
            .fetch_optional(&self.pool)
            .await?
        } else {
            sqlx::query_scalar(
                "UPDATE kv_entries \
                 SET value = $2, version = version + 1, updated_at = now() \
                 WHERE key = $1 AND version = $3 \
                 RETURNING version",
            )
            .bind(key)
            .bind(&value)
            .bind(to_db_version(expected_version))
            .fetch_optional(&self.pool)
            .await?
        };

        match written {
            Some(version) => Ok(from_db_version(version)),
            None => {
                let actual = self.current_version(key).await?;
                Err(StoreError::VersionConflict {
                    key: key.to_owned(),
                    expected: expected_version,
                    actual,
                })
            }
        }
    }
}
