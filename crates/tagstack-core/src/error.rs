//! Error types for tagstack.

use thiserror::Error;
use uuid::Uuid;

/// Result type alias using tagstack's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for tagstack operations.
///
/// Business errors (everything except `Database`, `Serialization`, `Config`
/// and `Internal`) are resolved at the call boundary and never retried.
/// Absence and foreign ownership are reported identically so that callers
/// cannot probe for another tenant's records.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found, or not owned by the caller
    #[error("Not found: {0}")]
    NotFound(String),

    /// A bookmark operation referenced a tag the caller does not own
    #[error("Tag not found: {0}")]
    TagNotFound(Uuid),

    /// Parent tag is absent or belongs to another owner
    #[error("Parent tag not found: {0}")]
    InvalidParent(Uuid),

    /// Tag was asked to become its own parent
    #[error("Tag cannot be its own parent: {0}")]
    SelfParent(Uuid),

    /// Reparent would make a tag its own ancestor
    #[error("Moving tag {tag_id} under {parent_id} would create a cycle")]
    HierarchyCycle { tag_id: Uuid, parent_id: Uuid },

    /// Invalid input (blank required field, missing owner)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether this is a business/validation error rather than a
    /// storage or infrastructure failure.
    pub fn is_business(&self) -> bool {
        matches!(
            self,
            Error::NotFound(_)
                | Error::TagNotFound(_)
                | Error::InvalidParent(_)
                | Error::SelfParent(_)
                | Error::HierarchyCycle { .. }
                | Error::InvalidInput(_)
        )
    }

    pub fn tag_missing(id: Uuid) -> Self {
        Error::NotFound(format!("tag {}", id))
    }

    pub fn bookmark_missing(id: Uuid) -> Self {
        Error::NotFound(format!("bookmark {}", id))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
