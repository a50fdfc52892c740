//! Centralized configuration for api-server.
//!
//! All environment variables are loaded and validated at startup to fail fast
//! on misconfiguration rather than at request time.

use axum::http::HeaderValue;
use std::env;
use std::path::PathBuf;

/// Storage backend provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageProvider {
    /// In-memory storage (data lost on restart)
    Memory,
    /// SQLite file-based storage
    Sqlite,
}

impl StorageProvider {
    fn from_str(s: &str) -> Self {
        if s.eq_ignore_ascii_case("sqlite") {
            Self::Sqlite
        } else {
            Self::Memory
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn from_str(s: &str) -> Self {
        if s.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
#[error("Configuration error for {field}: {message}")]
pub struct ConfigError {
    pub field: &'static str,
    pub message: String,
}

/// Server configuration loaded from environment variables.
///
/// All fields are validated at construction time.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port (default: 3001)
    pub port: u16,
    /// CORS allow origin
    pub cors_allow_origin: HeaderValue,
    /// Storage provider
    pub storage_provider: StorageProvider,
    /// SQLite database path (default: ./data/clubs.db)
    pub db_path: PathBuf,
    /// Log format
    pub log_format: LogFormat,
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// Fails fast on invalid configuration.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Port: unset means default, anything else must parse
        let port = match env::var("PORT") {
            Ok(s) => s.trim().parse().map_err(|e| ConfigError {
                field: "PORT",
                message: format!("Invalid port '{}': {}", s, e),
            })?,
            Err(_) => 3001,
        };

        // CORS allow origin
        let cors_origin_str = env::var("CORS_ALLOW_ORIGIN").unwrap_or_else(|_| "*".into());
        let cors_allow_origin = if cors_origin_str == "*" {
            HeaderValue::from_static("*")
        } else {
            HeaderValue::from_str(&cors_origin_str).map_err(|e| ConfigError {
                field: "CORS_ALLOW_ORIGIN",
                message: format!("Invalid header value '{}': {}", cors_origin_str, e),
            })?
        };

        // Storage provider
        let storage_provider = StorageProvider::from_str(
            &env::var("STORAGE_PROVIDER").unwrap_or_else(|_| "sqlite".into()),
        );

        // DB path (for sqlite)
        let db_path = env::var("DB_PATH")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data/clubs.db"));

        // Log format
        let log_format =
            LogFormat::from_str(&env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".into()));

        Ok(Self {
            port,
            cors_allow_origin,
            storage_provider,
            db_path,
            log_format,
        })
    }

    /// Log warnings about configuration that is fine for dev but not for real use.
    pub fn warn_if_ephemeral(&self) {
        if self.storage_provider == StorageProvider::Memory {
            tracing::warn!(
                "STORAGE_PROVIDER=memory: members and clubs are lost on restart. \
                 Set STORAGE_PROVIDER=sqlite to persist them."
            );
        }
        if !cfg!(feature = "sqlite") && self.storage_provider == StorageProvider::Sqlite {
            tracing::warn!(
                "STORAGE_PROVIDER=sqlite requested but the `sqlite` feature is disabled; \
                 falling back to in-memory storage."
            );
        }
    }
}
