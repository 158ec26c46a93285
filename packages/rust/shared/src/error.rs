//! Error types for BurgerWatch.
//!
//! Library crates use [`BurgerWatchError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all BurgerWatch operations.
#[derive(Debug, thiserror::Error)]
pub enum BurgerWatchError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Page unreachable or page-load timeout.
    #[error("navigation error: {0}")]
    Navigation(String),

    /// Every lookup strategy for an element was exhausted.
    #[error("element not found: {description}")]
    ElementNotFound { description: String },

    /// Expected page or payload structure missing or malformed.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Store read or write failed.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// No usable browser executable could be resolved.
    #[error("browser driver not found: {0}")]
    DriverNotFound(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (invalid record, bad schedule entry, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BurgerWatchError>;

impl BurgerWatchError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create an element-not-found error describing what was searched for.
    pub fn element_not_found(description: impl Into<String>) -> Self {
        Self::ElementNotFound {
            description: description.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
