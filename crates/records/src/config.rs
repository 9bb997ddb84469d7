//! Configuration loaded from environment variables.
//!
//! # Variables
//!
//! | Variable | Default | |
//! |----------|---------|---|
//! | `WEPAY_RETAIN_RECORDS` | `true` | Default deletions set `deleted` instead of removing rows |
//! | `WEPAY_CASCADE_WITHDRAWALS` | `false` | Account deletions also delete withdrawals |
//! | `WEPAY_DATABASE_URL` | `DATABASE_URL` | `PostgreSQL` connection string |
//! | `WEPAY_DB_MAX_CONNECTIONS` | `10` | Pool size |
//!
//! A `.env` file in the working directory is loaded once per process, before
//! the first configuration is read.

use std::sync::Once;

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Deletion behaviour of a [`Records`](crate::Records) context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordsConfig {
    /// Whether a default deletion keeps the row and sets `deleted`.
    pub retain_records: bool,
    /// Whether deleting an account also deletes its withdrawals.
    pub cascade_withdrawals: bool,
}

impl Default for RecordsConfig {
    fn default() -> Self {
        Self {
            retain_records: true,
            cascade_withdrawals: false,
        }
    }
}

impl RecordsConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if a flag is not a boolean.
    pub fn from_env() -> Result<Self, ConfigError> {
        load_dotenv();
        Self::from_lookup(&env_lookup)
    }

    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            retain_records: get_bool_or_default(
                lookup,
                "WEPAY_RETAIN_RECORDS",
                defaults.retain_records,
            )?,
            cascade_withdrawals: get_bool_or_default(
                lookup,
                "WEPAY_CASCADE_WITHDRAWALS",
                defaults.cascade_withdrawals,
            )?,
        })
    }
}

/// `PostgreSQL` connection settings.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Connection URL (contains password).
    pub database_url: SecretString,
    /// Maximum pooled connections.
    pub max_connections: u32,
}

impl DatabaseConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if no database URL is set or the pool size is
    /// not a number.
    pub fn from_env() -> Result<Self, ConfigError> {
        load_dotenv();
        Self::from_lookup(&env_lookup)
    }

    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = get_database_url(lookup, "WEPAY_DATABASE_URL")?;
        let max_connections = get_env_or_default(lookup, "WEPAY_DB_MAX_CONNECTIONS", "10")
            .parse::<u32>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("WEPAY_DB_MAX_CONNECTIONS".to_string(), e.to_string())
            })?;

        Ok(Self {
            database_url,
            max_connections,
        })
    }
}

/// Load `.env` into the process environment unless an earlier call did.
///
/// Returns whether this call did the loading.
fn load_dotenv() -> bool {
    static LOADED: Once = Once::new();
    let mut first = false;
    LOADED.call_once(|| {
        first = true;
        let _ = dotenvy::dotenv();
    });
    first
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(
    lookup: &impl Fn(&str) -> Option<String>,
    primary_key: &str,
) -> Result<SecretString, ConfigError> {
    lookup(primary_key)
        .or_else(|| lookup("DATABASE_URL"))
        .map(SecretString::from)
        .ok_or_else(|| ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> String {
    lookup(key).unwrap_or_else(|| default.to_string())
}

fn get_bool_or_default(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: bool,
) -> Result<bool, ConfigError> {
    lookup(key).map_or(Ok(default), |value| parse_bool(key, &value))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected a boolean, got {other:?}"),
        )),
    }
}
