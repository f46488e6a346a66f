//! Transport-free request and response shapes for the memory service.
//!
//! These mirror the wire contract of the add/search endpoints: ids are
//! reported as `faiss_id`, and `vector` may be sent flat (`[0.1, 0.2]`) or
//! as a single-row batch (`[[0.1, 0.2]]`).

use serde::{Deserialize, Serialize};

use crate::types::RecordId;
use crate::validation::{ValidationError, single_row};

/// A query or memory vector as accepted on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VectorInput {
    /// `[f32; D]`
    Flat(Vec<f32>),
    /// `[[f32; D]; rows]`; only `rows == 1` is accepted.
    Rows(Vec<Vec<f32>>),
}

impl VectorInput {
    /// Reduce to the single row the service operates on.
    ///
    /// Dimension is not checked here; see
    /// [`validate_embedding`](crate::validation::validate_embedding).
    pub fn as_row(&self) -> Result<&[f32], ValidationError> {
        match self {
            Self::Flat(v) => Ok(v.as_slice()),
            Self::Rows(rows) => single_row(rows),
        }
    }
}

impl From<Vec<f32>> for VectorInput {
    fn from(v: Vec<f32>) -> Self {
        Self::Flat(v)
    }
}

/// Request to remember a text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddMemoryRequest {
    /// Precomputed embedding. Computed from `text` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector: Option<VectorInput>,
    pub text: String,
    pub owner_id: i64,
}

impl AddMemoryRequest {
    /// A request whose vector will be computed by the embedder.
    pub fn text(owner_id: i64, text: impl Into<String>) -> Self {
        Self {
            vector: None,
            text: text.into(),
            owner_id,
        }
    }

    /// A request carrying its own vector.
    pub fn with_vector(owner_id: i64, text: impl Into<String>, vector: impl Into<VectorInput>) -> Self {
        Self {
            vector: Some(vector.into()),
            text: text.into(),
            owner_id,
        }
    }
}

/// Result of a successful add.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddMemoryResponse {
    /// Id of the persisted record.
    pub faiss_id: RecordId,
    pub message: String,
}

/// Request for the nearest stored memories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchMemoryRequest {
    pub vector: VectorInput,
    /// Defaults to [`DEFAULT_K`](crate::service::DEFAULT_K).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k: Option<usize>,
}

/// One search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub faiss_id: RecordId,
    pub text: String,
    /// Euclidean distance from the query.
    pub distance: f32,
}

/// Search hits in ascending distance order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SearchMemoryResponse {
    pub matches: Vec<Match>,
}
