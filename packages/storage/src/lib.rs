// ABOUTME: Data layer and persistence bootstrap for tagkit
// ABOUTME: Shared storage error type, SQLite pool setup, and embedded migrations

pub mod db;

use tagkit_core::ValidationError;
use thiserror::Error;

pub use db::{
    begin_write, connect, connect_from_env, connect_with_options, run_migrations, DatabaseConfig,
};

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<ValidationError> for StorageError {
    fn from(err: ValidationError) -> Self {
        StorageError::Validation(err.to_string())
    }
}

impl StorageError {
    /// True when the error is a storage-level uniqueness violation
    pub fn is_unique_violation(&self) -> bool {
        match self {
            StorageError::Sqlx(err) => is_unique_violation(err),
            _ => false,
        }
    }
}

/// Whether a sqlx error came from a UNIQUE constraint
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}
