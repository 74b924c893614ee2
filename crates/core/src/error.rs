//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Every variant is local and recoverable: an operation that returns one of
/// these has not mutated any state. Infrastructure concerns (files, encoding)
/// belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A movement quantity was zero, negative, or would push stock past `i64::MAX`.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(i64),

    /// The referenced medication does not exist in the store.
    #[error("medication not found: {0}")]
    MedicationNotFound(String),

    /// An outflow would drive stock below zero.
    #[error("insufficient stock (available: {available}, requested: {requested})")]
    InsufficientStock { available: i64, requested: i64 },

    /// A payload failed its schema or a business predicate.
    #[error("validation failed: {0}")]
    ValidationFailed(String),

    /// A directory uniqueness constraint was violated.
    #[error("duplicate entity: {0}")]
    DuplicateEntity(String),

    /// An identifier could not be parsed.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A requested record was not found (non-medication lookups).
    #[error("not found")]
    NotFound,
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationFailed(msg.into())
    }

    pub fn duplicate(msg: impl Into<String>) -> Self {
        Self::DuplicateEntity(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn medication_not_found(id: impl core::fmt::Display) -> Self {
        Self::MedicationNotFound(id.to_string())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    /// Short stable name of the error kind (for logs and batch reports).
    pub fn kind(&self) -> &'static str {
        match self {
            DomainError::InvalidQuantity(_) => "invalid_quantity",
            DomainError::MedicationNotFound(_) => "medication_not_found",
            DomainError::InsufficientStock { .. } => "insufficient_stock",
            DomainError::ValidationFailed(_) => "validation_failed",
            DomainError::DuplicateEntity(_) => "duplicate_entity",
            DomainError::InvalidId(_) => "invalid_id",
            DomainError::NotFound => "not_found",
        }
    }
}

impl From<validator::ValidationErrors> for DomainError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::ValidationFailed(errors.to_string())
    }
}
