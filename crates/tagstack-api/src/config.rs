//! Server configuration read from the environment.
//!
//! | Variable | Default |
//! |---|---|
//! | `HOST` | `0.0.0.0` |
//! | `PORT` | `3000` |
//! | `STORAGE_BACKEND` | `postgres` (`memory` keeps everything in process) |
//! | `DATABASE_URL` | `postgres://localhost/tagstack` |
//! | `RUN_MIGRATIONS` | `true` |
//! | `DB_*` | see [`PoolConfig::from_lookup`] |
//! | `LOG_FORMAT` | `text` (`json` for structured output) |
//! | `LOG_FILE` | unset (stdout only) |
//! | `LOG_ANSI` | auto |

use std::net::SocketAddr;

use tagstack_core::{Error, Result};
use tagstack_db::PoolConfig;

pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost/tagstack";

/// Where tags and bookmarks are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl std::str::FromStr for StorageBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(Error::Config(format!(
                "STORAGE_BACKEND must be 'postgres' or 'memory', got {:?}",
                other
            ))),
        }
    }
}

/// Logging output settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub json: bool,
    pub file: Option<String>,
    /// Explicit ANSI override; `None` lets the layer decide.
    pub ansi: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub storage: StorageBackend,
    pub database_url: String,
    pub run_migrations: bool,
    pub pool: PoolConfig,
    pub log: LogConfig,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("PORT must be a port number, got {:?}", raw)))?,
            None => 3000,
        };
        let storage = match lookup("STORAGE_BACKEND") {
            Some(raw) => raw.parse()?,
            None => StorageBackend::Postgres,
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            storage,
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            run_migrations: lookup("RUN_MIGRATIONS").map_or(true, |v| is_truthy(&v)),
            pool: PoolConfig::from_lookup(&lookup)?,
            log: LogConfig {
                json: lookup("LOG_FORMAT").is_some_and(|v| v.eq_ignore_ascii_case("json")),
                file: lookup("LOG_FILE").filter(|v| !v.trim().is_empty()),
                ansi: lookup("LOG_ANSI").map(|v| is_truthy(&v)),
            },
        })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| Error::Config(format!("invalid HOST/PORT: {}", e)))
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim(), "true" | "1" | "yes")
}
