//! Error types for tarball-dl
//!
//! A single [`Error`] enum covers every failure the library reports. Input errors
//! (configuration, malformed URLs) surface to the caller directly; per-task errors
//! (fetch, missing artifact, invalid archive) are absorbed by the retry loop and
//! end up as the message of a failed [`DownloadOutcome`](crate::types::DownloadOutcome).

use std::path::PathBuf;
use thiserror::Error;

/// Message used when a failure carries no usable description.
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error occurred.";

/// Result type alias for tarball-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for tarball-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "max_concurrent_downloads")
        key: Option<String>,
    },

    /// URL could not be turned into a download destination
    #[error("malformed URL '{url}': {reason}")]
    MalformedUrl {
        /// The offending URL as given
        url: String,
        /// Why the URL was rejected
        reason: String,
    },

    /// Target subdirectory would place files outside the base directory
    #[error("unsafe target directory '{subdirectory}': {reason}")]
    UnsafeTarget {
        /// Subdirectory as given by the manifest or URL
        subdirectory: String,
        /// Why it was rejected
        reason: String,
    },

    /// Network failure while fetching a tarball
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        /// URL being fetched
        url: String,
        /// Underlying HTTP client error
        #[source]
        source: reqwest::Error,
    },

    /// Server answered with a non-success status
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// URL being fetched
        url: String,
        /// Status code returned by the server
        status: u16,
    },

    /// Fetch reported completion but nothing exists at the reported path
    #[error("tgz does not exist {}", path.display())]
    MissingArtifact {
        /// Path the fetcher claimed to have written
        path: PathBuf,
    },

    /// Downloaded file is not a readable archive (it has been deleted)
    #[error("invalid archive {}: {reason}", path.display())]
    InvalidArchive {
        /// Path of the rejected archive
        path: PathBuf,
        /// Parser error or other reason for rejection
        reason: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A blocking helper task panicked or was cancelled
    #[error("background task failed: {0}")]
    TaskPanicked(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// The error reported for failures that carry no description.
    pub fn unknown() -> Self {
        Error::Other(UNKNOWN_ERROR_MESSAGE.to_string())
    }

    /// Wrap an arbitrary message, falling back to [`Error::unknown`] when it is blank.
    pub fn other(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.trim().is_empty() {
            Self::unknown()
        } else {
            Error::Other(message)
        }
    }

    /// Build a configuration error for `key`.
    pub fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }

    /// Build a malformed-URL error.
    pub fn malformed_url(url: &str, reason: impl Into<String>) -> Self {
        Error::MalformedUrl {
            url: url.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(e: tokio::task::JoinError) -> Self {
        Error::TaskPanicked(e.to_string())
    }
}
