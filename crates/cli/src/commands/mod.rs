//! Subcommand implementations.

pub mod records;
pub mod tables;

use thiserror::Error;
use wepay_records::{ConfigError, DatabaseConfig, PgStore, RepositoryError, create_pool};

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// A record operation failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Input file could not be read.
    #[error("Cannot read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// Input or output JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Input file is neither an object nor an array of objects.
    #[error("Expected a JSON object or an array of objects in {0}")]
    NotObjects(String),

    /// No record with the given id.
    #[error("No {entity} with id {id}")]
    NotFound { entity: &'static str, id: i64 },
}

/// Connect to the configured database.
pub async fn connect() -> Result<PgStore, CommandError> {
    let config = DatabaseConfig::from_env()?;
    tracing::info!(max_connections = config.max_connections, "Connecting to database...");
    let pool = create_pool(&config.database_url, config.max_connections).await?;
    Ok(PgStore::new(pool))
}
