//! Error types for confluence-bridge.
//!
//! Library crates use [`BridgeError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all bridge operations.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// Configuration error: missing credentials, bad URL, missing tool argument.
    #[error("config error: {message}")]
    Config { message: String },

    /// The caller asked for a tool that does not exist.
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// Transport-level failure (connection refused, timeout, TLS).
    #[error("network error: {0}")]
    Network(String),

    /// The backend answered with a non-success status.
    #[error("backend error: HTTP {status}")]
    Backend {
        status: u16,
        /// Error body returned by the backend (parsed JSON, or raw text).
        detail: Option<serde_json::Value>,
    },

    /// A success response could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BridgeError>;

impl BridgeError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
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

    /// Whether this error originates from the backend round trip.
    ///
    /// Backend errors are recovered into error-shaped results; everything
    /// else is fatal to the current invocation.
    pub fn is_backend(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Backend { .. } | Self::Decode(_)
        )
    }

    /// The detail reported to the caller for a backend failure: the backend's
    /// own error body when it sent one, otherwise the error message.
    pub fn detail(&self) -> serde_json::Value {
        match self {
            Self::Backend {
                detail: Some(detail),
                ..
            } => detail.clone(),
            other => serde_json::Value::String(other.to_string()),
        }
    }
}
