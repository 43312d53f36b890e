//! Application configuration parsed from environment variables.
//!
//! DESIGN
//! ======
//! Every knob has a default so `cargo run` with an empty environment starts
//! an in-memory server on port 3000. `main` loads `.env` (if present) before
//! calling [`AppConfig::from_env`].

use std::path::PathBuf;

use crate::services::persistence::SaveConfig;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_STATIC_DIR: &str = "public";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown RECORD_STORE: {0} (expected memory, postgres or hosted)")]
    UnknownStore(String),
    #[error("missing required env var: {0}")]
    Missing(&'static str),
}

/// Which record store backs the services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    Memory,
    Postgres { database_url: String, max_connections: u32 },
    Hosted { base_url: String, project_id: String, public_key: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    pub store: StoreConfig,
    pub save: SaveConfig,
    pub static_dir: PathBuf,
}

impl AppConfig {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `RECORD_STORE`: `memory`, `postgres` or `hosted`; defaults to
    ///   `postgres` when `DATABASE_URL` is set, else `memory`
    /// - `DATABASE_URL`, `DB_MAX_CONNECTIONS` (postgres)
    /// - `RECORDS_BASE_URL`, `RECORDS_PROJECT_ID`, `RECORDS_PUBLIC_KEY` (hosted)
    /// - `SAVE_DEBOUNCE_MS`, `SAVE_RETRIES`, `SAVE_RETRY_BASE_MS`
    /// - `STATIC_DIR`: default `public`
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown store or a missing store variable.
    pub fn from_env() -> Result<Self, ConfigError> {
        let store = parse_store(
            std::env::var("RECORD_STORE").ok().as_deref(),
            std::env::var("DATABASE_URL").ok(),
        )?;
        Ok(Self {
            port: env_parse("PORT", DEFAULT_PORT),
            store,
            save: SaveConfig::from_env(),
            static_dir: std::env::var("STATIC_DIR")
                .map_or_else(|_| PathBuf::from(DEFAULT_STATIC_DIR), PathBuf::from),
        })
    }
}

fn parse_store(raw: Option<&str>, database_url: Option<String>) -> Result<StoreConfig, ConfigError> {
    let kind = raw.unwrap_or(if database_url.is_some() { "postgres" } else { "memory" });
    match kind {
        "memory" => Ok(StoreConfig::Memory),
        "postgres" => Ok(StoreConfig::Postgres {
            database_url: database_url.ok_or(ConfigError::Missing("DATABASE_URL"))?,
            max_connections: env_parse("DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS),
        }),
        "hosted" => Ok(StoreConfig::Hosted {
            base_url: required("RECORDS_BASE_URL")?.trim_end_matches('/').to_string(),
            project_id: required("RECORDS_PROJECT_ID")?,
            public_key: required("RECORDS_PUBLIC_KEY")?,
        }),
        other => Err(ConfigError::UnknownStore(other.to_string())),
    }
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::Missing(key))
}

/// Parse an env var, falling back to `default` when absent or malformed.
pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
