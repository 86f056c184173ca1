//! Error types for the service layer.

use cyoda_client::RepositoryError;
use thiserror::Error;

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, EntityServiceError>;

/// Broad classification of an [`EntityServiceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceErrorKind {
    /// The repository raised an error.
    Repository,
    /// A snapshot search exceeded its timeout.
    Timeout,
    /// The target entity does not exist.
    NotFound,
    /// The caller's payload is unusable (e.g. missing business-id field).
    InvalidInput,
    /// The platform accepted a write but reported no entity id.
    MissingId,
    /// Anything else (serialization, token acquisition).
    Internal,
}

/// The single failure value of the entity service.
#[derive(Debug, Error)]
#[error("{operation} failed for {entity_class}{}: {message}", id_suffix(.entity_id))]
pub struct EntityServiceError {
    pub operation: String,
    pub entity_class: String,
    pub entity_id: Option<String>,
    pub message: String,
    pub kind: ServiceErrorKind,
}

fn id_suffix(entity_id: &Option<String>) -> String {
    entity_id
        .as_deref()
        .map(|id| format!(" (id {id})"))
        .unwrap_or_default()
}

impl EntityServiceError {
    pub fn new(
        operation: &str,
        entity_class: &str,
        entity_id: Option<&str>,
        message: impl Into<String>,
        kind: ServiceErrorKind,
    ) -> Self {
        Self {
            operation: operation.to_string(),
            entity_class: entity_class.to_string(),
            entity_id: entity_id.map(str::to_string),
            message: message.into(),
            kind,
        }
    }

    /// Wraps a repository error with operation context.
    pub fn from_repository(
        operation: &str,
        entity_class: &str,
        entity_id: Option<&str>,
        error: RepositoryError,
    ) -> Self {
        let kind = if error.is_timeout() {
            ServiceErrorKind::Timeout
        } else {
            ServiceErrorKind::Repository
        };
        Self::new(operation, entity_class, entity_id, error.to_string(), kind)
    }

    pub fn not_found(operation: &str, entity_class: &str, entity_id: Option<&str>, message: impl Into<String>) -> Self {
        Self::new(operation, entity_class, entity_id, message, ServiceErrorKind::NotFound)
    }

    pub fn invalid_input(operation: &str, entity_class: &str, message: impl Into<String>) -> Self {
        Self::new(operation, entity_class, None, message, ServiceErrorKind::InvalidInput)
    }

    pub fn missing_id(operation: &str, entity_class: &str, entity_id: Option<&str>) -> Self {
        let message = match operation {
            "update" => "no entity ID returned from update",
            _ => "no entity ID returned",
        };
        Self::new(operation, entity_class, entity_id, message, ServiceErrorKind::MissingId)
    }

    pub fn internal(operation: &str, entity_class: &str, entity_id: Option<&str>, message: impl Into<String>) -> Self {
        Self::new(operation, entity_class, entity_id, message, ServiceErrorKind::Internal)
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ServiceErrorKind::NotFound
    }
}

/// Errors raised while wiring the shared services.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Shared services exist and were built from a different configuration.
    #[error("services already initialized with a different configuration")]
    AlreadyInitialized,

    /// The transport client could not be created.
    #[error("client setup failed: {0}")]
    Client(#[from] RepositoryError),
}
