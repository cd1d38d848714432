//! Error types for bundle-dl
//!
//! Errors are split by the boundary that handles them:
//! - [`FetchError`] is recorded against a single resource and never stops a run
//! - [`ArchiveError`] covers packing and saving the final archive and ends the run
//! - [`Error`] is the crate-level error returned from public operations

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for bundle-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for bundle-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "archive_name")
        key: Option<String>,
    },

    /// A run was requested while another one is still active
    #[error("a download run is already in progress")]
    RunInProgress,

    /// Retrieval of a single resource failed
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Building or saving the archive failed
    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Build a configuration error for the given key
    pub fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }
}

/// Errors produced while retrieving one resource
///
/// The `Display` output is what ends up in the log surface and in
/// `DownloadOutcome::Failed`, so it is kept short (e.g. `HTTP 404`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The server answered with a non-success status
    #[error("HTTP {status}")]
    Http {
        /// The response status code
        status: u16,
    },

    /// The transfer failed or was aborted before completion
    #[error("network error: {0}")]
    Network(String),

    /// The identifier could not be turned into a URL or path
    #[error("invalid resource identifier: {0}")]
    InvalidIdentifier(String),
}

impl FetchError {
    /// Classify a reqwest error raised while sending or streaming a request
    pub(crate) fn from_reqwest(url: &str, e: &reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            return FetchError::Http {
                status: status.as_u16(),
            };
        }
        let message = if e.is_timeout() {
            format!("timed out fetching '{}'", url)
        } else if e.is_connect() {
            format!("connection failed for '{}': {}", url, e)
        } else {
            format!("transfer of '{}' failed: {}", url, e)
        };
        FetchError::Network(message)
    }

    /// Classify an I/O error raised while reading a local resource
    pub(crate) fn from_io(path: &std::path::Path, e: &std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound => FetchError::Http { status: 404 },
            std::io::ErrorKind::PermissionDenied => FetchError::Http { status: 403 },
            _ => FetchError::Network(format!("failed to read '{}': {}", path.display(), e)),
        }
    }
}

/// Errors produced while packing or saving the archive
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The packer could not build the archive
    #[error("packing failed: {0}")]
    Packing(String),

    /// The archive could not be handed to the user
    #[error("failed to save archive to {path}: {reason}")]
    Save {
        /// The destination the archive was meant for
        path: PathBuf,
        /// The reason saving failed
        reason: String,
    },
}
