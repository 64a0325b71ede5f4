//! Error types for confdown.
//!
//! Library crates use [`ConfdownError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all confdown operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfdownError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Transport failure against the Confluence API: connection error or a
    /// non-success HTTP status. Fatal to a running export; calls are never
    /// retried.
    #[error("api error: {0}")]
    Api(String),

    /// Malformed API payload (response body that fails to decode).
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (bad user input, invalid base URL, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ConfdownError>;

impl ConfdownError {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = ConfdownError::config("missing base_url");
        assert_eq!(err.to_string(), "config error: missing base_url");

        let err = ConfdownError::validation("no space keys given");
        assert!(err.to_string().contains("no space keys"));
    }

    #[test]
    fn api_error_carries_detail() {
        let err = ConfdownError::Api("GET /rest/api/content/search returned 503".into());
        assert!(err.to_string().starts_with("api error:"));
        assert!(err.to_string().contains("503"));
    }
}
