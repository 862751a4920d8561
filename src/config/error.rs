//! Configuration failure modes.

use std::io;
use thiserror::Error;

/// Failure modes for loading and validating configuration. Machine
/// construction validates its inputs with the same vocabulary, so these
/// errors also surface when a machine is built with a bad state set or
/// policy.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file exists but could not be read.
    #[error("could not read configuration: {0}")]
    Io(#[from] io::Error),

    /// The configuration file is not well-formed TOML.
    #[error("configuration is not valid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// A structural or cross-field check failed.
    #[error("invalid configuration: {0}")]
    Validation(String),

    /// A setting that must be present was absent or blank.
    #[error("required setting '{0}' is missing")]
    MissingValue(String),

    /// A setting holds a value outside its accepted range or vocabulary.
    #[error("setting '{field}' rejects value '{value}': {reason}")]
    InvalidValue {
        /// Which setting was rejected.
        field: String,
        /// The offending value, rendered.
        value: String,
        /// Why the value was rejected.
        reason: String,
    },
}

impl ConfigError {
    /// Builds an invalid-value error for a named setting.
    pub fn invalid_value(
        field: impl Into<String>,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        ConfigError::InvalidValue {
            field: field.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// Builds a missing-value error for a named setting.
    pub fn missing_value(field: impl Into<String>) -> Self {
        ConfigError::MissingValue(field.into())
    }

    /// Builds a validation error from a free-form message.
    pub fn validation_error(message: impl Into<String>) -> Self {
        ConfigError::Validation(message.into())
    }
}
