//! Error types for spring-core
//!
//! The animation state machines never fail; these errors only come from
//! loading and validating configuration.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for spring operations
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Failed to read config file: {path}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write config file: {path}")]
    ConfigWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse TOML in {path}: {message}")]
    ConfigParse {
        path: PathBuf,
        message: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize config: {message}")]
    ConfigSerialize {
        message: String,
        #[source]
        source: toml::ser::Error,
    },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl CoreError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}
