//! Validation of vectors entering the index.
//!
//! Every vector that reaches the index, whether supplied by a caller or
//! computed by the embedder, passes through [`validate_embedding`]. Batch
//! shaped input is first reduced to a single row with [`single_row`].

// ─────────────────────────────────────────────────────────────────────────────
// Validation Error
// ─────────────────────────────────────────────────────────────────────────────

/// Specific validation failures for embedding vectors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// Embedding dimension mismatch.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Actual dimension.
        actual: usize,
    },

    /// Batch-shaped input that does not hold exactly one row.
    #[error("unexpected embedding shape: expected 1 row, got {rows}")]
    UnexpectedShape {
        /// Number of rows supplied.
        rows: usize,
    },

    /// Embedding contains invalid values (NaN or Inf).
    #[error("embedding contains {count} invalid values (NaN or Inf)")]
    InvalidEmbeddingValues {
        /// Number of invalid values found.
        count: usize,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Embedding Validation
// ─────────────────────────────────────────────────────────────────────────────

/// Validate an embedding vector.
///
/// Checks:
/// 1. Length equals `expected_dim` (an empty vector never passes)
/// 2. No NaN or Inf values
pub fn validate_embedding(embedding: &[f32], expected_dim: usize) -> Result<(), ValidationError> {
    if embedding.is_empty() || embedding.len() != expected_dim {
        return Err(ValidationError::DimensionMismatch {
            expected: expected_dim,
            actual: embedding.len(),
        });
    }

    let invalid_count = embedding.iter().filter(|v| !v.is_finite()).count();
    if invalid_count > 0 {
        return Err(ValidationError::InvalidEmbeddingValues {
            count: invalid_count,
        });
    }

    Ok(())
}

/// Reduce `(rows, D)` input to its single row.
pub fn single_row(rows: &[Vec<f32>]) -> Result<&[f32], ValidationError> {
    match rows {
        [row] => Ok(row.as_slice()),
        _ => Err(ValidationError::UnexpectedShape { rows: rows.len() }),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
