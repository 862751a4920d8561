//! Configuration management for the agent journal.
//!
//! Configuration is loaded from a TOML file with programmatic defaults for
//! anything absent; a missing file yields the default configuration. All
//! loaded values are validated before use.

mod error;

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub use error::ConfigError;

/// Minimum accepted RSA modulus size.
const MIN_KEY_BITS: usize = 2048;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    /// Logging configuration.
    pub logging: LoggingConfig,
    /// Key generation configuration.
    pub crypto: CryptoConfig,
    /// Durable proof store configuration.
    pub store: StoreConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            crypto: CryptoConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct LoggingConfig {
    /// Log level: one of `off`, `error`, `warn`, `info`, `debug`, `trace`.
    pub level: String,
    /// Whether to install a console logger during [`crate::init`].
    pub console: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            console: true,
        }
    }
}

impl LoggingConfig {
    /// Maps the configured level to a `log` filter.
    pub fn level_filter(&self) -> Result<log::LevelFilter, ConfigError> {
        match self.level.to_lowercase().as_str() {
            "off" => Ok(log::LevelFilter::Off),
            "error" => Ok(log::LevelFilter::Error),
            "warn" => Ok(log::LevelFilter::Warn),
            "info" => Ok(log::LevelFilter::Info),
            "debug" => Ok(log::LevelFilter::Debug),
            "trace" => Ok(log::LevelFilter::Trace),
            other => Err(ConfigError::invalid_value(
                "logging.level",
                other,
                "expected one of: off, error, warn, info, debug, trace",
            )),
        }
    }
}

/// Key generation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct CryptoConfig {
    /// RSA modulus size for generated identities.
    pub key_bits: usize,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self { key_bits: MIN_KEY_BITS }
    }
}

/// Durable proof store backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Keep proofs in memory only.
    Memory,
    /// Persist proofs to the file system.
    File,
}

/// Durable proof store configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct StoreConfig {
    /// Storage backend.
    #[serde(rename = "type")]
    pub backend: StoreBackend,
    /// Base path for file storage (ignored for memory storage).
    pub base_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            base_path: "./journal_data".to_string(),
        }
    }
}

impl Config {
    /// Loads configuration from a TOML file.
    ///
    /// A missing file is not an error: defaults are returned instead.
    /// Whatever is loaded is validated before being returned.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config = if path.exists() {
            let contents = fs::read_to_string(path)?;
            toml::from_str(&contents)?
        } else {
            Config::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.logging.level_filter()?;

        if self.crypto.key_bits < MIN_KEY_BITS {
            return Err(ConfigError::invalid_value(
                "crypto.key_bits",
                self.crypto.key_bits,
                format!("must be at least {}", MIN_KEY_BITS),
            ));
        }

        if self.store.backend == StoreBackend::File && self.store.base_path.trim().is_empty() {
            return Err(ConfigError::missing_value("store.base_path"));
        }

        Ok(())
    }
}
