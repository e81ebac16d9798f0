//! Database settings for the `PostgreSQL` adapters.
//!
//! Settings come from the environment:
//!
//! - `COTERIE_DATABASE_URL` (required)
//! - `COTERIE_DATABASE_MAX_CONNECTIONS` (default 10)
//! - `COTERIE_DATABASE_CONNECT_TIMEOUT_SECS` (default 30)

use crate::membership::adapters::postgres::MembershipPgPool;
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PoolError};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Environment variable holding the connection URL.
pub const DATABASE_URL_VAR: &str = "COTERIE_DATABASE_URL";
/// Environment variable holding the pool size.
pub const MAX_CONNECTIONS_VAR: &str = "COTERIE_DATABASE_MAX_CONNECTIONS";
/// Environment variable holding the connection timeout in seconds.
pub const CONNECT_TIMEOUT_VAR: &str = "COTERIE_DATABASE_CONNECT_TIMEOUT_SECS";

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Errors raised while loading settings or building the pool.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required variable is unset or empty.
    #[error("missing required environment variable {0}")]
    MissingVariable(&'static str),

    /// A numeric variable could not be parsed or is zero.
    #[error("{variable} must be a positive integer, got '{value}'")]
    InvalidNumber {
        /// Offending variable.
        variable: &'static str,
        /// Raw value found.
        value: String,
    },

    /// The connection pool could not be created.
    #[error("failed to build database pool: {0}")]
    Pool(#[from] PoolError),
}

/// Connection settings for the `PostgreSQL` membership store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseSettings {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of pooled connections.
    pub max_connections: u32,
    /// How long to wait for a pooled connection.
    pub connection_timeout: Duration,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            connection_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }
}

impl DatabaseSettings {
    /// Loads settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the URL is missing or a numeric value is
    /// invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Loads settings through `lookup`, which maps variable names to values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the URL is missing or a numeric value is
    /// invalid.
    pub fn from_env_with(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let url = lookup(DATABASE_URL_VAR)
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
            .ok_or(ConfigError::MissingVariable(DATABASE_URL_VAR))?;

        let max_connections = match lookup(MAX_CONNECTIONS_VAR) {
            Some(raw) => u32::try_from(parse_positive(MAX_CONNECTIONS_VAR, &raw)?).map_err(|_| {
                ConfigError::InvalidNumber {
                    variable: MAX_CONNECTIONS_VAR,
                    value: raw.clone(),
                }
            })?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let connect_timeout_secs = match lookup(CONNECT_TIMEOUT_VAR) {
            Some(raw) => parse_positive(CONNECT_TIMEOUT_VAR, &raw)?,
            None => DEFAULT_CONNECT_TIMEOUT_SECS,
        };

        Ok(Self {
            url,
            max_connections,
            connection_timeout: Duration::from_secs(connect_timeout_secs),
        })
    }

    /// Builds the Diesel connection pool shared by the `PostgreSQL`
    /// adapters.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Pool`] when the pool cannot open its initial
    /// connections.
    pub fn build_pool(&self) -> Result<MembershipPgPool, ConfigError> {
        info!(
            max_connections = self.max_connections,
            connect_timeout_secs = self.connection_timeout.as_secs(),
            "creating membership database pool"
        );
        let manager = ConnectionManager::<PgConnection>::new(self.url.clone());
        let pool = Pool::builder()
            .max_size(self.max_connections)
            .connection_timeout(self.connection_timeout)
            .build(manager)?;
        Ok(pool)
    }
}

fn parse_positive(variable: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|value| *value > 0)
        .ok_or_else(|| ConfigError::InvalidNumber {
            variable,
            value: raw.to_owned(),
        })
}
