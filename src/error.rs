//! This module defines all error types used throughout the application.

use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum Error {
    /// IO errors (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A module could not be read from its source
    #[error("Failed to load module {locator}: {message}")]
    ModuleLoad { locator: String, message: String },

    /// A module was read but its content is not a valid export table
    #[error("Invalid module format in {file:?}: {message}")]
    ModuleFormat { file: PathBuf, message: String },

    /// The locator names a host this build cannot load from
    #[error("Unsupported module locator: {0}")]
    UnsupportedLocator(String),

    /// Module loading did not finish in time
    #[error("Loading {locator} timed out after {after:?}")]
    Timeout { locator: String, after: Duration },

    /// A recognized export could not be normalized
    #[error("Malformed export: {0}")]
    Normalize(String),

    /// Template compilation or rendering errors
    #[error("Template error: {0}")]
    Template(String),

    /// File discovery errors
    #[error("Discovery error: {0}")]
    Discovery(String),

    /// Generic error with custom message
    #[error("{0}")]
    Custom(String),

    /// Wrapped anyhow errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a custom error with a message
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }

    /// Create a normalization error
    pub fn normalize(msg: impl Into<String>) -> Self {
        Self::Normalize(msg.into())
    }

    /// Create a template error
    pub fn template(msg: impl Into<String>) -> Self {
        Self::Template(msg.into())
    }
}
