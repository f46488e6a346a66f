//! Embedding memory for mnemo.
//!
//! This crate keeps an in-memory nearest-neighbor index of text embeddings
//! consistent with a durable record store. The store owns identity; the
//! index is derived state that can always be rebuilt from it.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  MemoryService                                                          │
//! │  - add: validate → persist (id assigned) → insert → rebuild             │
//! │  - search: validate → query → re-join against the store                 │
//! │  - load: list all → embed each → rebuild                                │
//! ├──────────────────────────────────┬──────────────────────────────────────┤
//! │  RecordStore (durable)           │  VectorIndex (RwLock)                │
//! │  - SqliteRecordStore (WAL)       │  - vector set, insertion order       │
//! │  - InMemoryRecordStore           │  - flat N×D matrix, exact k-NN       │
//! └──────────────────────────────────┴──────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use mnemo_embed::MockEmbedder;
//! use mnemo_memory::{MemoryService, SqliteRecordStore};
//!
//! # async fn run() -> mnemo_memory::Result<()> {
//! let store = Arc::new(SqliteRecordStore::open("memory.db")?);
//! let service = MemoryService::new(store, Arc::new(MockEmbedder::new(4)))?;
//! service.load().await?;
//!
//! let added = service.add_vector(1, "a", vec![1.0, 0.0, 0.0, 0.0]).await?;
//! let matches = service.search(&[0.9, 0.1, 0.0, 0.0], 1)?;
//! assert_eq!(matches[0].faiss_id, added.faiss_id);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod backend;
pub mod error;
pub mod index;
pub mod service;
pub mod store;
pub mod types;
pub mod validation;

pub use api::{
    AddMemoryRequest, AddMemoryResponse, Match, SearchMemoryRequest, SearchMemoryResponse,
    VectorInput,
};
pub use backend::{InMemoryRecordStore, RecordStore};
pub use error::{MemoryError, Result};
pub use index::{IndexStats, Neighbor, VectorIndex};
pub use service::{DEFAULT_K, LoadReport, MemoryService, ServiceState, ServiceStats};
pub use store::SqliteRecordStore;
pub use types::{IndexedVector, MemoryRecord, RecordId};
pub use validation::{ValidationError, validate_embedding};
