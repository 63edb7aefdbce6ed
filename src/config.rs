//! Configuration management for HashLedger

use crate::blockchain::DEFAULT_GENESIS_DATA;
use crate::error::{ChainError, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "config.toml";
/// Database path that disables durable storage.
pub const IN_MEMORY_DB: &str = ":memory:";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

impl DatabaseConfig {
    pub fn is_in_memory(&self) -> bool {
        self.path == IN_MEMORY_DB
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    #[serde(default = "default_genesis_data")]
    pub genesis_data: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            genesis_data: default_genesis_data(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_db_path() -> String {
    "./data/ledger.db".to_string()
}

fn default_genesis_data() -> String {
    DEFAULT_GENESIS_DATA.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Config {
    /// Parses a TOML document; missing sections and keys take defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(s).map_err(|e| ChainError::Config(format!("Invalid TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.database.path.is_empty() {
            return Err(ChainError::Config(
                "database.path must not be empty".to_string(),
            ));
        }
        if self.ledger.genesis_data.trim().is_empty() {
            return Err(ChainError::Config(
                "ledger.genesis_data must not be blank".to_string(),
            ));
        }
        if self.server.port == 0 {
            return Err(ChainError::Config("server.port must not be 0".to_string()));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Loads `config.toml` from the working directory, falling back to defaults
/// when the file is absent.
pub fn load_config() -> Result<Config> {
    let path = Path::new(DEFAULT_CONFIG_FILE);
    if !path.exists() {
        return Ok(Config::default());
    }
    load_config_from(path)
}

/// Loads the given TOML file; unlike [`load_config`] a missing file is an
/// error.
pub fn load_config_from(path: &Path) -> Result<Config> {
    let config_str = fs::read_to_string(path).map_err(|e| {
        ChainError::Config(format!("Failed to read {}: {}", path.display(), e))
    })?;
    Config::from_toml_str(&config_str)
}
