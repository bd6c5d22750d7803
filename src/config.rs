//! Configuration management for the task API.
//!
//! Configuration can be set via environment variables (a `.env` file in the
//! working directory is loaded first when present):
//! - `HOST` - Optional. Server host. Defaults to `127.0.0.1`.
//! - `PORT` - Optional. Server port. Defaults to `3000`.
//! - `TASK_STORE` - Optional. `memory` or `sqlite`. Defaults to `sqlite`.
//! - `DATABASE_PATH` - Optional. SQLite database file. Defaults to `./data/tasks.db`.

use std::path::PathBuf;
use thiserror::Error;

use crate::task::TaskStoreType;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DATABASE_PATH: &str = "./data/tasks.db";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Storage backend
    pub store_type: TaskStoreType,

    /// SQLite database file (ignored by the memory store)
    pub database_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            store_type: TaskStoreType::default(),
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if `PORT` or `TASK_STORE` cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|e| ConfigError::InvalidValue("PORT".to_string(), format!("{}", e)))?,
            None => DEFAULT_PORT,
        };

        let store_type = match lookup("TASK_STORE") {
            Some(raw) => TaskStoreType::parse(&raw).ok_or_else(|| {
                ConfigError::InvalidValue(
                    "TASK_STORE".to_string(),
                    format!("expected `memory` or `sqlite`, got `{}`", raw),
                )
            })?,
            None => TaskStoreType::default(),
        };

        let database_path = lookup("DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH));

        Ok(Self {
            host,
            port,
            store_type,
            database_path,
        })
    }

    /// Socket address string to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[])).expect("defaults");
        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.store_type, TaskStoreType::Sqlite);
        assert_eq!(config.database_path, PathBuf::from(DEFAULT_DATABASE_PATH));
        assert_eq!(config.bind_addr(), "127.0.0.1:3000");
    }

    #[test]
    fn test_reads_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("HOST", "0.0.0.0"),
            ("PORT", "8080"),
            ("TASK_STORE", "memory"),
            ("DATABASE_PATH", "/tmp/t.db"),
        ]))
        .expect("overrides");
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
        assert_eq!(config.store_type, TaskStoreType::Memory);
        assert_eq!(config.database_path, PathBuf::from("/tmp/t.db"));
    }

    #[test]
    fn test_rejects_bad_port_and_store() {
        let err = Config::from_lookup(lookup(&[("PORT", "http")])).expect_err("bad port");
        assert!(matches!(err, ConfigError::InvalidValue(ref key, _) if key == "PORT"));

        let err = Config::from_lookup(lookup(&[("TASK_STORE", "json")])).expect_err("bad store");
        assert!(err.to_string().contains("TASK_STORE"));
    }
}
