//! Error types for pathweaver.
//!
//! Library crates use [`PathweaverError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Per-resource and per-provider failures are absorbed and logged where they
//! occur; only whole-pipeline failures (`NoResourcesFound`,
//! `InsufficientNodes`) propagate to the caller.

use std::path::PathBuf;

/// Classification of a single-URL fetch failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// The fetch did not complete within its timeout budget.
    Timeout,
    /// The origin refused the request (403/429 and friends).
    Blocked,
    /// The response body could not be parsed into usable content.
    ParseFailure,
    /// Connection, DNS, or transport failure.
    NetworkError,
}

impl std::fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Timeout => "timeout",
            Self::Blocked => "blocked",
            Self::ParseFailure => "parse failure",
            Self::NetworkError => "network error",
        };
        f.write_str(s)
    }
}

/// Top-level error type for all pathweaver operations.
#[derive(Debug, thiserror::Error)]
pub enum PathweaverError {
    /// Request parameters rejected before the pipeline starts.
    #[error("invalid parameters: {message}")]
    InvalidParameters { message: String },

    /// One content provider failed. Non-fatal; absorbed at the
    /// acquisition boundary.
    #[error("provider '{provider}' failed: {message}")]
    Provider { provider: String, message: String },

    /// Every provider failed or returned nothing. Fatal.
    #[error("no resources found for topic '{topic}'")]
    NoResourcesFound { topic: String },

    /// A single URL could not be fetched. Non-fatal; the candidate is dropped.
    #[error("fetch failed for {url}: {kind}")]
    Fetch { url: String, kind: FetchErrorKind },

    /// Assembly produced fewer concrete nodes than the configured minimum.
    #[error("tree has {actual} concrete nodes, minimum is {minimum}")]
    InsufficientNodes { actual: usize, minimum: usize },

    /// Browser pool launch or navigation infrastructure error.
    #[error("browser error: {0}")]
    Browser(String),

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Serialization/deserialization error.
    #[error("conversion error: {0}")]
    Conversion(String),

    /// Unknown task identifier.
    #[error("task not found: {id}")]
    TaskNotFound { id: String },

    /// The pipeline observed its cancellation flag and stopped.
    #[error("task canceled")]
    Canceled,
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PathweaverError>;

impl PathweaverError {
    /// Create an invalid-parameters error from any displayable message.
    pub fn invalid_params(msg: impl Into<String>) -> Self {
        Self::InvalidParameters {
            message: msg.into(),
        }
    }

    /// Create a provider error from a provider name and message.
    pub fn provider(provider: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: msg.into(),
        }
    }

    /// Create a per-URL fetch error.
    pub fn fetch(url: impl Into<String>, kind: FetchErrorKind) -> Self {
        Self::Fetch {
            url: url.into(),
            kind,
        }
    }

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

    /// Whether the error is fatal for a whole pipeline run (as opposed to a
    /// per-resource or per-provider failure the pipeline absorbs).
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Provider { .. } | Self::Fetch { .. })
    }
}
