//! Database primitives: environment-driven settings and pool construction.

use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

/// Shared connection pool alias.
pub type DbPool = DatabaseConnection;

pub const DEFAULT_DATABASE_URL: &str = "postgres://hr:hr@localhost:5432/hr";

#[derive(Debug, Error)]
pub enum DbError {
    #[error("database url missing")]
    MissingUrl,
    #[error("database connection failed: {0}")]
    Connect(#[from] DbErr),
}

pub type DbResult<T> = Result<T, DbError>;

#[derive(Clone, Debug, Deserialize)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    10
}

fn default_connect_timeout_secs() -> u64 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl DatabaseSettings {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Reads `DATABASE_URL` and `DATABASE_MAX_CONNECTIONS`.
    pub fn from_env() -> Self {
        let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_max_connections);
        Self {
            url: std::env::var("DATABASE_URL").ok(),
            max_connections,
            ..Self::default()
        }
    }

    pub fn database_url(&self) -> DbResult<&str> {
        self.url.as_deref().ok_or(DbError::MissingUrl)
    }

    /// Falls back to the local development database.
    pub fn database_url_or_default(&self) -> &str {
        self.url.as_deref().unwrap_or(DEFAULT_DATABASE_URL)
    }
}

pub async fn connect(settings: &DatabaseSettings) -> DbResult<DbPool> {
    let mut options = ConnectOptions::new(settings.database_url_or_default().to_owned());
    options
        .max_connections(settings.max_connections)
        .connect_timeout(Duration::from_secs(settings.connect_timeout_secs));
    let pool = Database::connect(options).await?;
    info!(max_connections = settings.max_connections, "database pool ready");
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_url_is_reported() {
        let settings = DatabaseSettings::default();
        assert!(matches!(settings.database_url(), Err(DbError::MissingUrl)));
        assert_eq!(settings.database_url_or_default(), DEFAULT_DATABASE_URL);
    }

    #[test]
    fn explicit_url_wins() {
        let settings = DatabaseSettings::new("sqlite::memory:");
        assert_eq!(settings.database_url().unwrap(), "sqlite::memory:");
        assert_eq!(settings.max_connections, 10);
    }
}
