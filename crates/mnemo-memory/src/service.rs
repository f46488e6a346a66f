//! Memory service: keeps the vector index consistent with the record store.
//!
//! The record store is the source of truth for identity. The service
//! persists first and indexes second, so every indexed id has a durable
//! record behind it.
//!
//! # Locking
//!
//! - `index` (`parking_lot::RwLock`) guards the vector set and the search
//!   structure together. Searches hold the read lock for the query only;
//!   writers hold the write lock for insert+rebuild only.
//! - `writer` (`tokio::sync::Mutex`) serializes `add` and `load` across
//!   their awaits, so a rebuild from a record snapshot cannot discard an
//!   entry persisted concurrently.
//!
//! Record store calls and embedding never run under the index lock.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use mnemo_embed::SharedEmbedder;
use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::api::{AddMemoryRequest, AddMemoryResponse, Match, SearchMemoryRequest, SearchMemoryResponse};
use crate::backend::RecordStore;
use crate::error::{MemoryError, Result};
use crate::index::{IndexStats, VectorIndex};
use crate::types::{IndexedVector, MemoryRecord, RecordId};
use crate::validation::validate_embedding;

/// Neighbors returned when a search does not specify `k`.
pub const DEFAULT_K: usize = 3;

// ─────────────────────────────────────────────────────────────────────────────
// Types
// ─────────────────────────────────────────────────────────────────────────────

/// Lifecycle of the service's index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceState {
    /// `load()` has not completed yet; only entries added since startup are indexed.
    Uninitialized,
    /// The index was rebuilt from the full record store at least once.
    Ready,
}

/// Outcome of [`MemoryService::load`].
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    /// Records read from the store.
    pub total: usize,
    /// Records that made it into the index.
    pub indexed: usize,
    /// Records skipped because embedding failed or produced an invalid vector.
    pub skipped: usize,
    /// Wall time of the load.
    pub elapsed: Duration,
}

/// Service-level statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServiceStats {
    pub state: ServiceState,
    #[serde(flatten)]
    pub index: IndexStats,
}

// ─────────────────────────────────────────────────────────────────────────────
// Memory Service
// ─────────────────────────────────────────────────────────────────────────────

/// Orchestrates record store writes with vector index updates.
pub struct MemoryService {
    records: Arc<dyn RecordStore>,
    embedder: SharedEmbedder,
    index: RwLock<VectorIndex>,
    writer: Mutex<()>,
    ready: AtomicBool,
    default_k: usize,
}

impl std::fmt::Debug for MemoryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryService")
            .field("embedder", &self.embedder.name())
            .field("state", &self.state())
            .field("index", &self.index.read().stats())
            .finish_non_exhaustive()
    }
}

impl MemoryService {
    /// Create a service in the `Uninitialized` state.
    ///
    /// The index dimension is taken from the embedder and fixed for the
    /// lifetime of the service.
    pub fn new(records: Arc<dyn RecordStore>, embedder: SharedEmbedder) -> Result<Self> {
        let index = VectorIndex::new(embedder.dimensions())?;
        Ok(Self {
            records,
            embedder,
            index: RwLock::new(index),
            writer: Mutex::new(()),
            ready: AtomicBool::new(false),
            default_k: DEFAULT_K,
        })
    }

    /// Override the `k` used when a search request omits it.
    pub fn with_default_k(mut self, k: usize) -> Self {
        self.default_k = k;
        self
    }

    /// Vector dimension `D`.
    pub fn dimensions(&self) -> usize {
        self.index.read().dimensions()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ServiceState {
        if self.ready.load(Ordering::Acquire) {
            ServiceState::Ready
        } else {
            ServiceState::Uninitialized
        }
    }

    /// Index statistics plus lifecycle state.
    pub fn stats(&self) -> ServiceStats {
        ServiceStats {
            state: self.state(),
            index: self.index.read().stats(),
        }
    }

    /// The record store this service writes to.
    pub fn records(&self) -> &Arc<dyn RecordStore> {
        &self.records
    }

    // ─── Load ───────────────────────────────────────────────────────────────

    /// Rebuild the index from every record in the store.
    ///
    /// Each record's vector is recomputed by the embedder. Records that fail
    /// to embed, or embed to an invalid vector, are logged and skipped; they
    /// stay in the store.
    pub async fn load(&self) -> Result<LoadReport> {
        let _writer = self.writer.lock().await;
        let start = Instant::now();
        let dims = self.dimensions();

        let records = self.records.list_all()?;
        let total = records.len();
        let mut entries = Vec::with_capacity(total);

        for record in records {
            match self.embed_record(&record, dims).await {
                Ok(vector) => entries.push(IndexedVector::new(record.id, vector, record.text)),
                Err(e) => warn!("Skipping memory record {} during load: {}", record.id, e),
            }
        }

        let indexed = entries.len();
        self.index.write().rebuild(entries)?;
        self.ready.store(true, Ordering::Release);

        let report = LoadReport {
            total,
            indexed,
            skipped: total - indexed,
            elapsed: start.elapsed(),
        };
        info!(
            "Memory index loaded: {} indexed, {} skipped of {} records in {:?}",
            report.indexed, report.skipped, report.total, report.elapsed
        );
        Ok(report)
    }

    async fn embed_record(&self, record: &MemoryRecord, dims: usize) -> Result<Vec<f32>> {
        let vector = self.embedder.embed(&record.text).await?;
        validate_embedding(&vector, dims)?;
        Ok(vector)
    }

    // ─── Add ────────────────────────────────────────────────────────────────

    /// Persist a memory and index it.
    ///
    /// Validation and embedding happen first; nothing is written if either
    /// fails. If the record is persisted but cannot be indexed, the call
    /// still succeeds and the message says indexing is deferred to the next
    /// [`load`](Self::load).
    pub async fn add(&self, request: AddMemoryRequest) -> Result<AddMemoryResponse> {
        let dims = self.dimensions();
        let vector = match &request.vector {
            Some(input) => {
                let row = input.as_row()?;
                validate_embedding(row, dims)?;
                row.to_vec()
            }
            None => {
                let vector = self.embedder.embed(&request.text).await?;
                validate_embedding(&vector, dims)?;
                vector
            }
        };

        let _writer = self.writer.lock().await;

        let record = self
            .records
            .create(request.owner_id, &request.text)
            .map_err(|e| match e {
                MemoryError::RecordPersist(_) => e,
                other => MemoryError::RecordPersist(other.to_string()),
            })?;

        if !record.id.is_valid() {
            return Err(MemoryError::RecordPersist(format!(
                "record was persisted but the store returned invalid id {}; not indexed",
                record.id
            )));
        }

        let id = record.id;
        let indexed = {
            let mut index = self.index.write();
            if index.contains(id) {
                return Err(MemoryError::RecordPersist(format!(
                    "record was persisted but the store returned id {id}, which is already indexed; not indexed"
                )));
            }
            let inserted = index.insert(id, vector, record.text);
            if inserted.is_ok() {
                index.refresh();
            }
            inserted
        };

        let message = match indexed {
            Ok(()) => {
                debug!("Added memory {} for owner {}", id, request.owner_id);
                format!("Memory added with id {id}")
            }
            Err(e) => {
                warn!("Memory {} persisted but not indexed: {}", id, e);
                format!("Memory stored with id {id}; indexing deferred until next load ({e})")
            }
        };

        Ok(AddMemoryResponse {
            faiss_id: id,
            message,
        })
    }

    /// Add a memory with a precomputed vector.
    pub async fn add_vector(
        &self,
        owner_id: i64,
        text: impl Into<String>,
        vector: Vec<f32>,
    ) -> Result<AddMemoryResponse> {
        self.add(AddMemoryRequest::with_vector(owner_id, text, vector))
            .await
    }

    /// Add a memory, computing its vector with the embedder.
    pub async fn add_text(&self, owner_id: i64, text: impl Into<String>) -> Result<AddMemoryResponse> {
        self.add(AddMemoryRequest::text(owner_id, text)).await
    }

    // ─── Search ─────────────────────────────────────────────────────────────

    /// The `min(k, N)` stored memories nearest to `vector`.
    ///
    /// Hits whose record no longer exists are dropped; the rest keep index
    /// order. An empty index yields an empty list.
    pub fn search(&self, vector: &[f32], k: usize) -> Result<Vec<Match>> {
        validate_embedding(vector, self.dimensions())?;
        if k == 0 {
            return Err(MemoryError::Query("k must be positive".to_string()));
        }

        let neighbors = self.index.read().query(vector, k)?;

        let mut matches = Vec::with_capacity(neighbors.len());
        for neighbor in neighbors {
            match self.records.get(neighbor.id)? {
                Some(record) => matches.push(Match {
                    faiss_id: neighbor.id,
                    text: record.text,
                    distance: neighbor.distance,
                }),
                None => debug!("Dropping index hit {} with no backing record", neighbor.id),
            }
        }

        debug!("Search returned {} matches (k={})", matches.len(), k);
        Ok(matches)
    }

    /// Embed `text` and search with the result.
    pub async fn search_text(&self, text: &str, k: usize) -> Result<Vec<Match>> {
        let vector = self.embedder.embed(text).await?;
        self.search(&vector, k)
    }

    /// Serve a [`SearchMemoryRequest`].
    pub fn search_request(&self, request: &SearchMemoryRequest) -> Result<SearchMemoryResponse> {
        let row = request.vector.as_row()?;
        let matches = self.search(row, request.k.unwrap_or(self.default_k))?;
        Ok(SearchMemoryResponse { matches })
    }

    /// Whether `id` currently has an index entry.
    pub fn is_indexed(&self, id: RecordId) -> bool {
        self.index.read().contains(id)
    }

    /// Ids currently in the vector set, in insertion order.
    pub fn indexed_ids(&self) -> Vec<RecordId> {
        self.index.read().entries().iter().map(|e| e.id).collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
