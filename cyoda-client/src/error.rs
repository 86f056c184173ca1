//! Error types for the transport client.

use std::time::Duration;
use thiserror::Error;

/// Result type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Errors raised by the transport client.
///
/// Read paths degrade to empty defaults instead of returning most of these;
/// writes, snapshot polling and authentication are strict.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// HTTP transport failure (connection, TLS, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A snapshot search stayed `RUNNING` past the configured timeout.
    #[error("snapshot search {snapshot_id} timed out after {waited:?}")]
    Timeout { snapshot_id: String, waited: Duration },

    /// The platform reported the snapshot search as failed.
    #[error("snapshot search {snapshot_id} failed with status {status}")]
    SnapshotFailed { snapshot_id: String, status: String },

    /// Unexpected status on a strict path.
    #[error("platform returned {status}: {body}")]
    Api { status: u16, body: String },

    /// Token acquisition failed.
    #[error("authentication error: {0}")]
    Auth(String),

    /// The repository does not provide this capability.
    #[error("operation not supported by this repository: {0}")]
    Unsupported(&'static str),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl RepositoryError {
    /// Returns true for the snapshot-search timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, RepositoryError::Timeout { .. })
    }

    /// Returns true if the repository lacks the requested capability.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, RepositoryError::Unsupported(_))
    }
}
