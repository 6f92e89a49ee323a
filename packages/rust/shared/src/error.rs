//! Error types for gardenlink.
//!
//! Library crates use [`GardenError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all gardenlink operations.
#[derive(Debug, thiserror::Error)]
pub enum GardenError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while talking to the content proxy.
    #[error("network error: {0}")]
    Network(String),

    /// HTML or response parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Garden document store error (missing garden, unreadable note, etc.).
    #[error("storage error: {0}")]
    Storage(String),

    /// Text completion error (API, transport, or response shape).
    #[error("completion error: {0}")]
    Completion(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Missing or empty required tool input.
    #[error("input error: {message}")]
    Input { message: String },

    /// Data validation error (bad path, invalid format, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, GardenError>;

impl GardenError {
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

    /// Create an input error from any displayable message.
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input {
            message: msg.into(),
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
