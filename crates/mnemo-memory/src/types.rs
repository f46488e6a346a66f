//! Core data types: durable records and their indexed vector form.

use serde::{Deserialize, Serialize};

/// Identifier assigned by the record store.
///
/// Ids are positive and issued monotonically; the vector index keys its
/// entries by the same value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(i64);

impl RecordId {
    /// Wrap a raw id.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// The raw integer value.
    pub fn get(self) -> i64 {
        self.0
    }

    /// Whether this id could have been issued by a record store.
    pub fn is_valid(self) -> bool {
        self.0 > 0
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// A durable memory record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Store-assigned id.
    pub id: RecordId,
    /// Owning user.
    pub owner_id: i64,
    /// The remembered text.
    pub text: String,
}

/// A record's vector form as held by the index.
///
/// `text` is a display cache of [`MemoryRecord::text`]; search results are
/// always re-joined against the record store.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedVector {
    /// Id of the backing record.
    pub id: RecordId,
    /// Embedding of length `D`.
    pub vector: Vec<f32>,
    /// Denormalized record text.
    pub text: String,
}

impl IndexedVector {
    /// Create a new indexed vector.
    pub fn new(id: RecordId, vector: Vec<f32>, text: impl Into<String>) -> Self {
        Self {
            id,
            vector,
            text: text.into(),
        }
    }
}
