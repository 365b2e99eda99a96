//! Pricing API configuration module.
//!
//! Layers, lowest priority first:
//!
//! 1. Built-in defaults
//! 2. `pricing-api.toml` (or the file named by `STALLPLASS_CONFIG`), optional
//! 3. Environment variables prefixed `STALLPLASS_`, e.g. `STALLPLASS_HTTP_PORT=9000`

use std::env;
use std::time::Duration;

use ::config::builder::DefaultState;
use ::config::{Config, ConfigBuilder, Environment, File, FileFormat};
use serde::Deserialize;
use stallplass_db::DbConfig;

const DEFAULT_CONFIG_FILE: &str = "pricing-api.toml";
const DEFAULT_HTTP_PORT: u16 = 8080;
const DEFAULT_DATABASE_PATH: &str = "./stallplass.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_RATE_CACHE_TTL_SECS: u64 = 30;

/// Pricing API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// HTTP listen port
    pub http_port: u16,

    /// SQLite database file
    pub database_path: String,

    /// Connection pool size
    pub max_connections: u32,

    /// How long base prices and tiers are served from memory.
    /// Zero disables the cache.
    pub rate_cache_ttl_secs: u64,

    /// Bearer token for `/api/admin/*`. Admin routes are disabled without it.
    #[serde(default)]
    pub admin_token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            http_port: DEFAULT_HTTP_PORT,
            database_path: DEFAULT_DATABASE_PATH.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            rate_cache_ttl_secs: DEFAULT_RATE_CACHE_TTL_SECS,
            admin_token: None,
        }
    }
}

impl ApiConfig {
    /// Load configuration from defaults, the optional TOML file and the
    /// environment.
    pub fn load() -> Result<Self, ConfigError> {
        let path = env::var("STALLPLASS_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

        let settings = defaults()?
            .add_source(File::new(&path, FileFormat::Toml).required(false))
            .add_source(Environment::with_prefix("STALLPLASS").try_parsing(true))
            .build()?;

        Self::from_settings(settings)
    }

    fn from_settings(settings: Config) -> Result<Self, ConfigError> {
        let config: ApiConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.http_port == 0 {
            return Err(ConfigError::InvalidValue("http_port".to_string()));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue("max_connections".to_string()));
        }
        if self.database_path.trim().is_empty() {
            return Err(ConfigError::MissingRequired("database_path".to_string()));
        }
        if matches!(&self.admin_token, Some(token) if token.trim().is_empty()) {
            return Err(ConfigError::InvalidValue("admin_token".to_string()));
        }
        Ok(())
    }

    pub fn rate_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.rate_cache_ttl_secs)
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path).max_connections(self.max_connections)
    }
}

fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(Config::builder()
        .set_default("http_port", i64::from(DEFAULT_HTTP_PORT))?
        .set_default("database_path", DEFAULT_DATABASE_PATH)?
        .set_default("max_connections", i64::from(DEFAULT_MAX_CONNECTIONS))?
        .set_default("rate_cache_ttl_secs", DEFAULT_RATE_CACHE_TTL_SECS as i64)?)
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

// =============================================================================
// Unit Tests
// =============================================================================
