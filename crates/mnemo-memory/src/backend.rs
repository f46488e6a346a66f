//! Record store trait for pluggable durable storage.
//!
//! The memory service talks to its durable side only through [`RecordStore`].
//! [`SqliteRecordStore`](crate::store::SqliteRecordStore) is the production
//! implementation; [`InMemoryRecordStore`] backs tests and ephemeral runs.
//!
//! # Example
//!
//! ```
//! use mnemo_memory::{InMemoryRecordStore, RecordStore};
//!
//! let store = InMemoryRecordStore::new();
//! let record = store.create(1, "the sky is blue")?;
//! assert_eq!(store.get(record.id)?.unwrap().text, "the sky is blue");
//! # Ok::<(), mnemo_memory::MemoryError>(())
//! ```

use parking_lot::Mutex;

use crate::error::Result;
use crate::types::{MemoryRecord, RecordId};

/// Durable storage for memory records.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync` to allow sharing across threads.
pub trait RecordStore: Send + Sync {
    /// Durably create a record and return it with its assigned id.
    ///
    /// Ids must be positive and never reused. The record must be committed
    /// before this returns `Ok`.
    fn create(&self, owner_id: i64, text: &str) -> Result<MemoryRecord>;

    /// Get a record by id.
    ///
    /// Returns `Ok(None)` if the record does not exist.
    fn get(&self, id: RecordId) -> Result<Option<MemoryRecord>>;

    /// Every record, ordered by ascending id.
    fn list_all(&self) -> Result<Vec<MemoryRecord>>;

    /// Total number of records.
    fn count(&self) -> Result<usize>;
}

/// Volatile [`RecordStore`] holding records in a `Vec`.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    inner: Mutex<InMemoryState>,
}

#[derive(Debug, Default)]
struct InMemoryState {
    records: Vec<MemoryRecord>,
    last_id: i64,
}

impl InMemoryRecordStore {
    /// Create an empty store. The first issued id is 1.
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for InMemoryRecordStore {
    fn create(&self, owner_id: i64, text: &str) -> Result<MemoryRecord> {
        let mut state = self.inner.lock();
        state.last_id += 1;
        let record = MemoryRecord {
            id: RecordId::new(state.last_id),
            owner_id,
            text: text.to_string(),
        };
        state.records.push(record.clone());
        Ok(record)
    }

    fn get(&self, id: RecordId) -> Result<Option<MemoryRecord>> {
        let state = self.inner.lock();
        Ok(state.records.iter().find(|r| r.id == id).cloned())
    }

    fn list_all(&self) -> Result<Vec<MemoryRecord>> {
        // Ids are issued in push order, so the Vec is already ascending.
        Ok(self.inner.lock().records.clone())
    }

    fn count(&self) -> Result<usize> {
        Ok(self.inner.lock().records.len())
    }
}
