//! Postgres fixtures for roam's integration tests.
//!
//! Every test gets a throwaway database on one server per test binary.
//! Set `ROAM_TEST_PG_URL` (server URL without a database name) to use an
//! existing server; otherwise a container is started on first use.

use sqlx::migrate::MigrateDatabase;
use sqlx::postgres::Postgres;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use tokio::sync::OnceCell;
use uuid::Uuid;

use roam_db::config::DbConfig;
use roam_db::store::PgStore;

const PG_TAG: &str = "17";

enum Server {
    External(String),
    Container {
        url: String,
        _handle: ContainerAsync<testcontainers_modules::postgres::Postgres>,
    },
}

impl Server {
    fn url(&self) -> &str {
        match self {
            Self::External(url) | Self::Container { url, .. } => url,
        }
    }
}

static SERVER: OnceCell<Server> = OnceCell::const_new();

async fn start_server() -> Server {
    if let Ok(url) = std::env::var("ROAM_TEST_PG_URL") {
        return Server::External(url.trim_end_matches('/').to_owned());
    }

    let handle = testcontainers_modules::postgres::Postgres::default()
        .with_tag(PG_TAG)
        .start()
        .await
        .unwrap_or_else(|e| panic!("cannot start postgres:{PG_TAG} container: {e}"));
    let host = handle.get_host().await.expect("container host");
    let port = handle
        .get_host_port_ipv4(5432)
        .await
        .expect("container port 5432");

    Server::Container {
        url: format!("postgresql://postgres:postgres@{host}:{port}"),
        _handle: handle,
    }
}

/// A migrated [`PgStore`] on a database nobody else uses, plus that
/// database's URL for [`drop_test_db`].
pub async fn create_test_store() -> (PgStore, String) {
    let server = SERVER.get_or_init(start_server).await;
    let url = format!("{}/roam_test_{}", server.url(), Uuid::new_v4().simple());

    let store = PgStore::provision(&DbConfig::new(url.as_str()))
        .await
        .unwrap_or_else(|e| panic!("cannot provision test database: {e:#}"));
    (store, url)
}

/// Drop a database made by [`create_test_store`], open connections and all.
pub async fn drop_test_db(url: &str) {
    if let Err(e) = Postgres::force_drop_database(url).await {
        eprintln!("leaving test database behind: {e}");
    }
}
