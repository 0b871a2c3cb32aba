//! Error types for TRACELINK operations

use crate::EntityType;
use thiserror::Error;
use uuid::Uuid;

/// Storage layer errors.
///
/// Persistence failures propagate unchanged to the caller; the engine
/// performs no retry logic of its own.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Entity not found: {entity_type:?} with id {id}")]
    NotFound { entity_type: EntityType, id: Uuid },

    #[error("Insert failed for {entity_type:?}: {reason}")]
    InsertFailed {
        entity_type: EntityType,
        reason: String,
    },

    #[error("Query failed: {reason}")]
    QueryFailed { reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Correlation engine errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CorrelationError {
    #[error("Invalid case-id pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// Master error type for all TRACELINK errors.
#[derive(Debug, Clone, Error)]
pub enum TracelinkError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Correlation error: {0}")]
    Correlation(#[from] CorrelationError),
}

/// Result type alias for TRACELINK operations.
pub type TracelinkResult<T> = Result<T, TracelinkError>;

// =============================================================================
// TESTS
// =============================================================================
