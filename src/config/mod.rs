//! Application configuration.
//!
//! Settings come from three places, in this order: a `.env` file (optional),
//! environment variables (`DATABASE_URL`, `CARBON_CONFIG_PATH`), and a TOML file
//! (`config.toml` by default). Every TOML section is optional; a missing file
//! yields the built-in defaults.

/// Database connection and table creation
pub mod database;

/// Emission factor table loading from config.toml
pub mod factors;

/// Tracing subscriber setup
pub mod logging;

use crate::{
    core::{factors::FactorTable, history::DEFAULT_RECENT_LIMIT},
    errors::{Error, Result},
};
use serde::Deserialize;
use std::{path::Path, time::Duration};
use tracing::{debug, info, instrument};

use self::factors::FactorTableConfig;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// `[store]` section: limits applied at the store boundary.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct StoreSettings {
    /// Per-operation timeout in milliseconds
    pub timeout_ms: u64,
    /// Attempts before a racing aggregate insert is reported as a conflict
    pub max_attempts: u32,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            timeout_ms: 5_000,
            max_attempts: 3,
        }
    }
}

impl StoreSettings {
    /// Per-operation timeout as a [`Duration`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// `[history]` section: history screen defaults.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct HistorySettings {
    /// How many recent entries to list
    pub recent_limit: u64,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            recent_limit: DEFAULT_RECENT_LIMIT,
        }
    }
}

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// Store limits
    #[serde(default)]
    pub store: StoreSettings,
    /// History screen defaults
    #[serde(default)]
    pub history: HistorySettings,
    /// Emission factors; the built-in table when absent
    pub factors: Option<FactorTableConfig>,
}

/// Fully resolved settings for one process.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `SeaORM` connection string
    pub database_url: String,
    /// Store limits
    pub store: StoreSettings,
    /// History screen defaults
    pub history: HistorySettings,
    /// Validated emission factors
    pub factors: FactorTable,
}

impl AppConfig {
    /// Combines a parsed config file with a database URL, validating the factor table.
    pub fn from_file(file: ConfigFile, database_url: String) -> Result<Self> {
        let factors = match file.factors {
            Some(raw) => FactorTable::try_from(raw)?,
            None => FactorTable::default(),
        };

        if file.store.max_attempts == 0 {
            return Err(Error::Config {
                message: "[store] max_attempts must be at least 1".to_string(),
            });
        }

        Ok(Self {
            database_url,
            store: file.store,
            history: file.history,
            factors,
        })
    }
}

/// Parses config.toml contents.
///
/// # Errors
/// Returns [`Error::Config`] if the TOML syntax is invalid or a field has the wrong type.
pub fn parse_config(contents: &str) -> Result<ConfigFile> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads and parses a config file.
///
/// # Errors
/// Returns [`Error::Config`] if the file cannot be read or parsed.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ConfigFile> {
    let path_ref = path.as_ref();
    debug!("Loading configuration from {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;
    parse_config(&contents)
}

/// Loads `.env`, then the config file named by `CARBON_CONFIG_PATH` (default
/// `config.toml`), then resolves `DATABASE_URL`.
///
/// A missing config file is not an error; the defaults are used instead.
#[instrument]
pub fn load_app_configuration() -> Result<AppConfig> {
    if dotenvy::dotenv().is_ok() {
        debug!("Loaded .env file");
    }

    let path =
        std::env::var("CARBON_CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let file = if Path::new(&path).exists() {
        load_config(&path)?
    } else {
        info!("No config file at {path}, using built-in defaults");
        ConfigFile::default()
    };

    let config = AppConfig::from_file(file, database::get_database_url())?;
    info!(
        timeout_ms = config.store.timeout_ms,
        recent_limit = config.history.recent_limit,
        "Configuration loaded"
    );
    Ok(config)
}
