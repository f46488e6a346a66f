//! Error types for the memory crate.

use thiserror::Error;

use crate::validation::ValidationError;

/// Errors that can occur in the memory crate.
#[derive(Debug, Error)]
pub enum MemoryError {
    /// Database connection or operation failed.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A vector failed shape, dimension, or value validation.
    #[error("Invalid vector: {0}")]
    Validation(#[from] ValidationError),

    /// The record store could not durably create a record.
    #[error("Record persist failed: {0}")]
    RecordPersist(String),

    /// The embedder failed to produce a vector.
    #[error("Embedding error: {0}")]
    Embedding(#[from] mnemo_embed::EmbedError),

    /// Invalid query parameters.
    #[error("Query error: {0}")]
    Query(String),

    /// Invalid data or state.
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl MemoryError {
    /// True when the input vector could not be reshaped to `(1, D)`.
    pub fn is_dimension_mismatch(&self) -> bool {
        matches!(
            self,
            Self::Validation(
                ValidationError::DimensionMismatch { .. } | ValidationError::UnexpectedShape { .. }
            )
        )
    }
}

/// Result type alias for memory operations.
pub type Result<T> = std::result::Result<T, MemoryError>;
