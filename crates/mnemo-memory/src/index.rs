//! In-memory k-nearest-neighbor index over fixed-length vectors.
//!
//! The index keeps two things:
//!
//! - the **vector set**: every `(id, vector, text)` entry in insertion order
//! - the **search structure**: a row-major matrix built from the vector set,
//!   which is what queries actually scan
//!
//! [`VectorIndex::insert`] only appends to the vector set. The new vector is
//! invisible to [`VectorIndex::query`] until [`VectorIndex::rebuild`] or
//! [`VectorIndex::refresh`] runs. Callers that mutate must rebuild before the
//! next query.
//!
//! # Scaling
//!
//! Every rebuild copies all N vectors into a fresh N×D matrix, and every query
//! scans all N rows. Memory is O(N·D), rebuild and query are O(N·D). Writes
//! are expected to be rare relative to reads; past a few hundred thousand
//! entries the full rebuild on each write becomes the bottleneck.

use std::cmp::Ordering;

use serde::Serialize;
use tracing::debug;

use crate::error::{MemoryError, Result};
use crate::types::{IndexedVector, RecordId};
use crate::validation::validate_embedding;

// ─────────────────────────────────────────────────────────────────────────────
// Types
// ─────────────────────────────────────────────────────────────────────────────

/// One query hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Id of the matched entry.
    pub id: RecordId,
    /// Euclidean distance from the query (lower = more similar).
    pub distance: f32,
}

/// Snapshot of the index's size and freshness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    /// Entries in the vector set.
    pub entries: usize,
    /// Entries covered by the current search structure.
    pub indexed: usize,
    /// Vector dimension `D`.
    pub dimensions: usize,
    /// Number of rebuilds since creation.
    pub rebuilds: u64,
}

/// Exhaustive-scan neighbor structure.
#[derive(Debug, Default)]
struct FlatStructure {
    ids: Vec<RecordId>,
    /// `ids.len() * dimensions` values, one row per id.
    matrix: Vec<f32>,
}

impl FlatStructure {
    fn build(entries: &[IndexedVector], dimensions: usize) -> Self {
        let mut ids = Vec::with_capacity(entries.len());
        let mut matrix = Vec::with_capacity(entries.len() * dimensions);
        for entry in entries {
            ids.push(entry.id);
            matrix.extend_from_slice(&entry.vector);
        }
        Self { ids, matrix }
    }

    fn len(&self) -> usize {
        self.ids.len()
    }

    fn nearest(&self, query: &[f32], k: usize) -> Vec<Neighbor> {
        let k = k.min(self.len());
        if k == 0 {
            return Vec::new();
        }

        let mut scored: Vec<(usize, f32)> = self
            .matrix
            .chunks_exact(query.len())
            .map(|row| squared_distance(row, query))
            .enumerate()
            .collect();

        // Position breaks distance ties, so the order is total and the
        // partial selection below agrees with a full sort.
        let by_distance_then_position = |a: &(usize, f32), b: &(usize, f32)| -> Ordering {
            a.1.total_cmp(&b.1).then(a.0.cmp(&b.0))
        };

        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, by_distance_then_position);
            scored.truncate(k);
        }
        scored.sort_unstable_by(by_distance_then_position);

        scored
            .into_iter()
            .map(|(row, squared)| Neighbor {
                id: self.ids[row],
                distance: squared.sqrt(),
            })
            .collect()
    }
}

fn squared_distance(a: &[f32], b: &[f32]) -> f32 {
    let sum: f64 = a
        .iter()
        .zip(b)
        .map(|(x, y)| {
            let d = f64::from(*x) - f64::from(*y);
            d * d
        })
        .sum();
    sum as f32
}

// ─────────────────────────────────────────────────────────────────────────────
// Vector Index
// ─────────────────────────────────────────────────────────────────────────────

/// Vector set plus the search structure built from it.
///
/// Not internally synchronized; the memory service guards the whole index
/// with one lock so the set and structure are always observed together.
#[derive(Debug)]
pub struct VectorIndex {
    dimensions: usize,
    entries: Vec<IndexedVector>,
    structure: FlatStructure,
    /// Set by `insert`, cleared by `rebuild`/`refresh`.
    stale: bool,
    rebuilds: u64,
}

impl VectorIndex {
    /// Create an empty index for vectors of length `dimensions`.
    pub fn new(dimensions: usize) -> Result<Self> {
        if dimensions == 0 {
            return Err(MemoryError::InvalidData(
                "vector index dimension must be positive".to_string(),
            ));
        }
        Ok(Self {
            dimensions,
            entries: Vec::new(),
            structure: FlatStructure::default(),
            stale: false,
            rebuilds: 0,
        })
    }

    /// Vector dimension `D`.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Number of entries in the vector set.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the vector set is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries the search structure covers.
    pub fn built_len(&self) -> usize {
        self.structure.len()
    }

    /// Whether entries were inserted since the last rebuild.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> &[IndexedVector] {
        &self.entries
    }

    /// Whether any entry carries `id`.
    pub fn contains(&self, id: RecordId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    /// Current size and freshness.
    pub fn stats(&self) -> IndexStats {
        IndexStats {
            entries: self.entries.len(),
            indexed: self.structure.len(),
            dimensions: self.dimensions,
            rebuilds: self.rebuilds,
        }
    }

    /// Replace the vector set with `entries` and build a fresh structure.
    ///
    /// All entries are validated first; on error the index is unchanged. An
    /// empty `entries` clears the index.
    pub fn rebuild(&mut self, entries: Vec<IndexedVector>) -> Result<()> {
        for entry in &entries {
            validate_embedding(&entry.vector, self.dimensions)?;
        }
        self.entries = entries;
        self.build();
        Ok(())
    }

    /// Rebuild the structure from the current vector set.
    pub fn refresh(&mut self) {
        self.build();
    }

    fn build(&mut self) {
        self.structure = FlatStructure::build(&self.entries, self.dimensions);
        self.stale = false;
        self.rebuilds += 1;
        if self.entries.is_empty() {
            debug!("Vector index cleared; no entries to build");
        } else {
            debug!(
                "Rebuilt vector index with {} entries ({} dims)",
                self.entries.len(),
                self.dimensions
            );
        }
    }

    /// Append an entry to the vector set without rebuilding.
    ///
    /// Duplicate ids are accepted; id uniqueness belongs to the caller.
    pub fn insert(&mut self, id: RecordId, vector: Vec<f32>, text: impl Into<String>) -> Result<()> {
        validate_embedding(&vector, self.dimensions)?;
        self.entries.push(IndexedVector::new(id, vector, text));
        self.stale = true;
        Ok(())
    }

    /// The `min(k, N)` nearest entries by Euclidean distance.
    ///
    /// Results are ordered by ascending distance, ties by insertion order.
    /// Served from the search structure, so unrebuilt inserts are not seen.
    /// An empty index yields an empty result.
    pub fn query(&self, vector: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        validate_embedding(vector, self.dimensions)?;
        Ok(self.structure.nearest(vector, k))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: i64, vector: &[f32]) -> IndexedVector {
        IndexedVector::new(RecordId::new(id), vector.to_vec(), format!("entry {id}"))
    }

    fn ids(neighbors: &[Neighbor]) -> Vec<i64> {
        neighbors.iter().map(|n| n.id.get()).collect()
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(matches!(
            VectorIndex::new(0),
            Err(MemoryError::InvalidData(_))
        ));
    }

    #[test]
    fn test_empty_index_query_is_empty() {
        let index = VectorIndex::new(4).unwrap();
        assert!(index.query(&[1.0, 0.0, 0.0, 0.0], 3).unwrap().is_empty());
    }

    #[test]
    fn test_query_orders_by_distance() {
        let mut index = VectorIndex::new(4).unwrap();
        index
            .rebuild(vec![
                entry(1, &[0.0, 0.0, 1.0, 0.0]),
                entry(2, &[1.0, 0.0, 0.0, 0.0]),
                entry(3, &[0.9, 0.1, 0.0, 0.0]),
            ])
            .unwrap();

        let results = index.query(&[1.0, 0.0, 0.0, 0.0], 10).unwrap();
        assert_eq!(ids(&results), vec![2, 3, 1]);
        assert!(results[0].distance < 1e-6);
        assert!((results[2].distance - 2f32.sqrt()).abs() < 1e-5);
    }

    #[test]
    fn test_query_limits_to_k() {
        let mut index = VectorIndex::new(2).unwrap();
        let entries = (0..5).map(|i| entry(i + 1, &[i as f32, 0.0])).collect();
        index.rebuild(entries).unwrap();

        let results = index.query(&[2.2, 0.0], 2).unwrap();
        assert_eq!(ids(&results), vec![3, 4]);
        assert!(index.query(&[0.0, 0.0], 0).unwrap().is_empty());
    }

    #[test]
    fn test_ties_break_by_insertion_order() {
        let mut index = VectorIndex::new(2).unwrap();
        index
            .rebuild(vec![
                entry(30, &[0.0, 1.0]),
                entry(10, &[1.0, 0.0]),
                entry(20, &[0.0, -1.0]),
                entry(40, &[-1.0, 0.0]),
            ])
            .unwrap();

        let results = index.query(&[0.0, 0.0], 4).unwrap();
        assert_eq!(ids(&results), vec![30, 10, 20, 40]);

        let results = index.query(&[0.0, 0.0], 2).unwrap();
        assert_eq!(ids(&results), vec![30, 10]);
    }

    #[test]
    fn test_insert_is_invisible_until_rebuild() {
        let mut index = VectorIndex::new(2).unwrap();
        index.rebuild(vec![entry(1, &[5.0, 5.0])]).unwrap();

        index.insert(RecordId::new(2), vec![0.0, 0.0], "new").unwrap();
        assert!(index.is_stale());
        assert_eq!(index.len(), 2);
        assert_eq!(index.built_len(), 1);

        let results = index.query(&[0.0, 0.0], 5).unwrap();
        assert_eq!(ids(&results), vec![1]);

        index.refresh();
        assert!(!index.is_stale());
        let results = index.query(&[0.0, 0.0], 5).unwrap();
        assert_eq!(ids(&results), vec![2, 1]);
    }

    #[test]
    fn test_rebuild_with_empty_clears() {
        let mut index = VectorIndex::new(2).unwrap();
        index.rebuild(vec![entry(1, &[1.0, 1.0])]).unwrap();
        assert_eq!(index.query(&[1.0, 1.0], 1).unwrap().len(), 1);

        index.rebuild(Vec::new()).unwrap();
        assert!(index.is_empty());
        assert_eq!(index.built_len(), 0);
        assert!(index.query(&[1.0, 1.0], 1).unwrap().is_empty());
    }

    #[test]
    fn test_insert_rejects_bad_dimensions() {
        let mut index = VectorIndex::new(4).unwrap();

        let err = index.insert(RecordId::new(1), vec![1.0, 0.0, 0.0], "short").unwrap_err();
        assert!(err.is_dimension_mismatch());

        let err = index.insert(RecordId::new(1), Vec::new(), "empty").unwrap_err();
        assert!(err.is_dimension_mismatch());

        assert!(index.is_empty());
        assert!(!index.is_stale());
    }

    #[test]
    fn test_query_rejects_bad_dimensions() {
        let mut index = VectorIndex::new(4).unwrap();
        index.rebuild(vec![entry(1, &[1.0, 0.0, 0.0, 0.0])]).unwrap();

        let err = index.query(&[1.0, 0.0], 1).unwrap_err();
        assert!(err.is_dimension_mismatch());
    }

    #[test]
    fn test_rebuild_rejects_invalid_entry_and_keeps_state() {
        let mut index = VectorIndex::new(2).unwrap();
        index.rebuild(vec![entry(1, &[1.0, 1.0])]).unwrap();
        let before = index.stats();

        let result = index.rebuild(vec![entry(2, &[1.0, 1.0]), entry(3, &[1.0])]);
        assert!(result.is_err());
        assert_eq!(index.stats(), before);
        assert!(index.contains(RecordId::new(1)));
        assert!(!index.contains(RecordId::new(2)));
    }

    #[test]
    fn test_duplicate_ids_are_kept() {
        let mut index = VectorIndex::new(2).unwrap();
        index.insert(RecordId::new(1), vec![0.0, 0.0], "a").unwrap();
        index.insert(RecordId::new(1), vec![1.0, 0.0], "b").unwrap();
        index.refresh();

        let results = index.query(&[0.0, 0.0], 5).unwrap();
        assert_eq!(ids(&results), vec![1, 1]);
    }

    #[test]
    fn test_stats_track_rebuilds() {
        let mut index = VectorIndex::new(2).unwrap();
        assert_eq!(index.stats().rebuilds, 0);

        index.insert(RecordId::new(1), vec![0.0, 0.0], "a").unwrap();
        index.refresh();
        index.refresh();

        let stats = index.stats();
        assert_eq!(stats.rebuilds, 2);
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.indexed, 1);
        assert_eq!(stats.dimensions, 2);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    const DIMS: usize = 3;

    fn vector_strategy() -> impl Strategy<Value = Vec<f32>> {
        prop::collection::vec(-100.0f32..100.0, DIMS)
    }

    fn entries_strategy() -> impl Strategy<Value = Vec<IndexedVector>> {
        prop::collection::vec(vector_strategy(), 0..40).prop_map(|vectors| {
            vectors
                .into_iter()
                .enumerate()
                .map(|(i, v)| IndexedVector::new(RecordId::new(i as i64 + 1), v, ""))
                .collect()
        })
    }

    proptest! {
        /// Property: results are sorted by non-decreasing distance and hold min(k, N) entries.
        #[test]
        fn query_results_sorted_and_sized(
            entries in entries_strategy(),
            query in vector_strategy(),
            k in 1usize..60,
        ) {
            let n = entries.len();
            let mut index = VectorIndex::new(DIMS).unwrap();
            index.rebuild(entries).unwrap();

            let results = index.query(&query, k).unwrap();
            prop_assert_eq!(results.len(), k.min(n));
            for pair in results.windows(2) {
                prop_assert!(pair[0].distance <= pair[1].distance);
            }
        }

        /// Property: rebuilding twice from the same entries gives identical answers.
        #[test]
        fn rebuild_is_idempotent(
            entries in entries_strategy(),
            query in vector_strategy(),
            k in 1usize..60,
        ) {
            let mut index = VectorIndex::new(DIMS).unwrap();
            index.rebuild(entries.clone()).unwrap();
            let first = index.query(&query, k).unwrap();

            index.rebuild(entries).unwrap();
            let second = index.query(&query, k).unwrap();

            prop_assert_eq!(first, second);
        }

        /// Property: a partial (k < N) query is a prefix of the full ordering.
        #[test]
        fn partial_query_is_prefix_of_full(
            entries in entries_strategy(),
            query in vector_strategy(),
            k in 1usize..60,
        ) {
            let mut index = VectorIndex::new(DIMS).unwrap();
            let n = entries.len();
            index.rebuild(entries).unwrap();

            let full = index.query(&query, n.max(1)).unwrap();
            let partial = index.query(&query, k).unwrap();
            prop_assert_eq!(&full[..partial.len()], &partial[..]);
        }
    }
}
