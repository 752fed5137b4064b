//! Bootstrap configuration loading
//!
//! Two-tier configuration:
//! 1. **TOML bootstrap**: database path, bind address, port, token settings, logging.
//!    Read once at startup; a restart is needed to pick up changes.
//! 2. **Database runtime**: system settings in the `settings` table
//!    (`relato_server::db::settings`).
//!
//! Config file resolution order:
//! 1. Command-line argument (highest priority)
//! 2. `RELATO_CONFIG` environment variable
//! 3. `~/.config/relato/config.toml`, then `/etc/relato/config.toml`
//! 4. Compiled defaults (fallback)
//!
//! A missing config file is never fatal: defaults are used and a warning logged.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "RELATO_CONFIG";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    /// Path to the SQLite database file
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Address the HTTP server binds to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Secret used to sign bearer tokens
    ///
    /// When absent the secret is loaded from (or generated into) the settings table.
    #[serde(default)]
    pub token_secret: Option<String>,

    /// Bearer token lifetime
    #[serde(default = "default_token_ttl_seconds")]
    pub token_ttl_seconds: i64,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            bind_address: default_bind_address(),
            port: default_port(),
            token_secret: None,
            token_ttl_seconds: default_token_ttl_seconds(),
            logging: LoggingConfig::default(),
        }
    }
}

fn default_database_path() -> PathBuf {
    default_data_folder().join("relato.db")
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_token_ttl_seconds() -> i64 {
    86_400 // 24 hours
}

fn default_log_level() -> String {
    "info".to_string()
}

/// OS-dependent default data folder
pub fn default_data_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("relato"))
        .unwrap_or_else(|| PathBuf::from("./relato_data"))
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Resolve and load the bootstrap configuration
    ///
    /// An explicitly named file (CLI or env) that cannot be read is an error;
    /// a missing file at a default location falls back to compiled defaults.
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = cli_path {
            info!("Loading config from command line: {}", path.display());
            return Self::from_file(path);
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            info!("Loading config from {}: {}", CONFIG_ENV_VAR, path);
            return Self::from_file(Path::new(&path));
        }

        match find_default_config_file() {
            Some(path) => {
                info!("Loading config from {}", path.display());
                Self::from_file(&path)
            }
            None => {
                warn!("No config file found, using compiled defaults");
                Ok(Self::default())
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(Error::Config("port must be non-zero".to_string()));
        }
        if self.token_ttl_seconds <= 0 {
            return Err(Error::Config(
                "token_ttl_seconds must be positive".to_string(),
            ));
        }
        if let Some(secret) = &self.token_secret {
            if secret.trim().is_empty() {
                return Err(Error::Config(
                    "token_secret cannot be empty or whitespace-only".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Default config file locations, user config first
fn find_default_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("relato").join("config.toml"));
    let system_config = PathBuf::from("/etc/relato/config.toml");

    user_config
        .into_iter()
        .chain(std::iter::once(system_config))
        .find(|p| p.exists())
}
