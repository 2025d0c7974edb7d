//! Configuration module.
//!
//! All configuration is loaded from `MEMO_*` environment variables (and an
//! optional `.env` file) with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use crate::backend::{Backend, HttpBackend, MemoryBackend};
use crate::db::{self, Repository};
use crate::errors::AppError;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key for API authentication
    pub api_psk: Option<String>,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Keep everything in memory instead of SQLite
    pub in_memory: bool,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Remote store to talk to instead of a local one
    pub backend_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_psk: None,
            db_path: PathBuf::from("./data/memo.sqlite"),
            in_memory: false,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            log_level: "info".to_string(),
            backend_url: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let defaults = Self::default();

        let api_psk = lookup("MEMO_API_PSK").filter(|k| !k.is_empty());

        let db_path = lookup("MEMO_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);

        let in_memory = lookup("MEMO_IN_MEMORY")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(defaults.in_memory);

        let bind_addr = match lookup("MEMO_BIND_ADDR") {
            Some(addr) => addr
                .parse()
                .map_err(|e| AppError::BadRequest(format!("Invalid MEMO_BIND_ADDR {}: {}", addr, e)))?,
            None => defaults.bind_addr,
        };

        let log_level = lookup("MEMO_LOG_LEVEL").unwrap_or(defaults.log_level);

        let backend_url = lookup("MEMO_BACKEND_URL").filter(|u| !u.is_empty());

        Ok(Self {
            api_psk,
            db_path,
            in_memory,
            bind_addr,
            log_level,
            backend_url,
        })
    }

    /// Open the store this configuration describes.
    ///
    /// A remote URL wins over local storage; otherwise SQLite is used unless
    /// `in_memory` is set.
    pub async fn open_backend(&self) -> Result<Arc<dyn Backend>, AppError> {
        if let Some(url) = &self.backend_url {
            tracing::info!("Using remote store at {}", url);
            return Ok(Arc::new(HttpBackend::new(url, self.api_psk.clone())?));
        }

        if self.in_memory {
            tracing::info!("Using in-memory store");
            return Ok(Arc::new(MemoryBackend::new()));
        }

        tracing::info!("Using SQLite store at {:?}", self.db_path);
        let pool = db::init_database(&self.db_path).await?;
        Ok(Arc::new(Repository::new(pool)))
    }
}
