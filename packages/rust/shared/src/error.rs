//! Error types for the samples builder.
//!
//! Library crates use [`SampleBuilderError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all samples builder operations.
#[derive(Debug, thiserror::Error)]
pub enum SampleBuilderError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// The external parser failed or returned an unusable document.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// A category descriptor (`index.json`) is missing or malformed.
    #[error("category error for {category:?}: {message}")]
    Category { category: String, message: String },

    /// Embed template rendering error.
    #[error("render error: {0}")]
    Render(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (missing required field, placement collision, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Build cache record could not be read or written.
    #[error("cache error: {0}")]
    Cache(String),

    /// File system watcher error.
    #[error("watch error: {0}")]
    Watch(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SampleBuilderError>;

impl SampleBuilderError {
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

    /// Create a category error for the given category key.
    pub fn category(category: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Category {
            category: category.into(),
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
