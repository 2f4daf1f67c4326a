// ABOUTME: Database connection management and schema bootstrap
// ABOUTME: Builds the SQLite pool with WAL and foreign keys enabled, then applies migrations

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tagkit_config::constants::{TAGGING_DATABASE_URL, TAGGING_MAX_CONNECTIONS};
use tagkit_config::{env_string, env_u32_in_range};
use tracing::{debug, info};

use crate::StorageError;

/// Pool settings
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub busy_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            acquire_timeout: Duration::from_secs(30),
            busy_timeout: Duration::from_secs(30),
        }
    }
}

/// Open (creating if needed) the database file at `database_path` and migrate it
pub async fn connect(database_path: &Path) -> Result<SqlitePool, StorageError> {
    // Ensure parent directory exists
    if let Some(parent) = database_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(StorageError::Io)?;
        }
    }

    let options = SqliteConnectOptions::new()
        .filename(database_path)
        .create_if_missing(true);

    connect_with_options(options, DatabaseConfig::default()).await
}

/// Connect using `TAGGING_DATABASE_URL` and `TAGGING_MAX_CONNECTIONS`
pub async fn connect_from_env() -> Result<SqlitePool, StorageError> {
    let url = env_string(TAGGING_DATABASE_URL).ok_or_else(|| {
        StorageError::NotFound(format!("{} is not set", TAGGING_DATABASE_URL))
    })?;

    let mut config = DatabaseConfig::default();
    if let Some(max) = env_u32_in_range(TAGGING_MAX_CONNECTIONS, 1, 100) {
        config.max_connections = max;
    }

    let options = SqliteConnectOptions::from_str(&url)
        .map_err(StorageError::Sqlx)?
        .create_if_missing(true);

    connect_with_options(options, config).await
}

/// Build a pool from explicit options and run the embedded migrations
pub async fn connect_with_options(
    options: SqliteConnectOptions,
    config: DatabaseConfig,
) -> Result<SqlitePool, StorageError> {
    // Connection-level pragmas so every pooled connection gets them
    let options = options
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true)
        .busy_timeout(config.busy_timeout);

    debug!(
        "Connecting to database: {} (max_connections: {})",
        options.get_filename().display(),
        config.max_connections
    );

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect_with(options)
        .await
        .map_err(StorageError::Sqlx)?;

    info!("Database connection established");

    run_migrations(&pool).await?;

    Ok(pool)
}

/// Open a write transaction that takes the database write lock up front.
///
/// A deferred `BEGIN` that reads before writing fails with `SQLITE_BUSY` without waiting
/// once another writer commits first; `BEGIN IMMEDIATE` queues on the busy timeout instead.
pub async fn begin_write(pool: &SqlitePool) -> Result<Transaction<'static, Sqlite>, StorageError> {
    pool.begin_with("BEGIN IMMEDIATE")
        .await
        .map_err(StorageError::Sqlx)
}

/// Apply the tagging schema migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), StorageError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(StorageError::Migration)?;

    debug!("Database migrations completed");
    Ok(())
}
