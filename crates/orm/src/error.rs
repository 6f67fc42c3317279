//! Error types for the ORM layer
//!
//! Structural mistakes (unknown fields, missing constraints, unbound engines)
//! fail fast; storage failures are passed through from sqlx. A lookup that
//! matches nothing is never an error and is reported as `None` instead.

use thiserror::Error;

/// Result type alias for model operations
pub type ModelResult<T> = Result<T, ModelError>;

/// Error types for ORM operations
#[derive(Debug, Error)]
pub enum ModelError {
    /// No engine is bound to the model, or configuration is unusable
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A call was made without the arguments it requires
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// A field name that the model does not declare
    #[error("{model} has no column '{field}'")]
    UnknownField { model: String, field: String },

    /// Order direction other than `asc` or `desc`
    #[error("Invalid order direction '{0}': must be 'asc' or 'desc'")]
    InvalidDirection(String),

    /// Primary key shape does not fit the requested lookup
    #[error("Invalid key error: {0}")]
    InvalidKey(String),

    /// Primary key is missing on an instance that needs an identity
    #[error("Primary key is missing or invalid")]
    MissingPrimaryKey,

    /// `one()` matched no rows
    #[error("No row was found when one was required")]
    NoResultFound,

    /// `one()` matched more than one row
    #[error("Multiple rows were found when exactly one was required")]
    MultipleResultsFound,

    /// Model declaration rejected at registration time
    #[error("Schema error: {0}")]
    Schema(String),

    /// Database driver or query error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization/deserialization of a model's field set failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(String),
}

impl ModelError {
    pub(crate) fn unknown_field(model: &str, field: &str) -> Self {
        ModelError::UnknownField {
            model: model.to_string(),
            field: field.to_string(),
        }
    }

    /// Whether this is one of the `one()` cardinality failures
    pub fn is_cardinality(&self) -> bool {
        matches!(
            self,
            ModelError::NoResultFound | ModelError::MultipleResultsFound
        )
    }
}
