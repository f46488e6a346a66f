//! Memory record operations.

use rusqlite::{Row, params};
use tracing::debug;

use crate::backend::RecordStore;
use crate::error::{MemoryError, Result};
use crate::types::{MemoryRecord, RecordId};

use super::SqliteRecordStore;

impl SqliteRecordStore {
    /// Convert a database row to a MemoryRecord.
    fn row_to_record(row: &Row<'_>) -> rusqlite::Result<MemoryRecord> {
        Ok(MemoryRecord {
            id: RecordId::new(row.get(0)?),
            owner_id: row.get(1)?,
            text: row.get(2)?,
        })
    }
}

impl RecordStore for SqliteRecordStore {
    fn create(&self, owner_id: i64, text: &str) -> Result<MemoryRecord> {
        let record = self
            .with_transaction(|conn| {
                conn.execute(
                    "INSERT INTO memory_records (owner_id, text) VALUES (?1, ?2)",
                    params![owner_id, text],
                )?;
                Ok(MemoryRecord {
                    id: RecordId::new(conn.last_insert_rowid()),
                    owner_id,
                    text: text.to_string(),
                })
            })
            .map_err(|e| MemoryError::RecordPersist(e.to_string()))?;

        debug!("Created memory record {}", record.id);
        Ok(record)
    }

    fn get(&self, id: RecordId) -> Result<Option<MemoryRecord>> {
        let conn = self.conn.lock();

        let mut stmt =
            conn.prepare("SELECT id, owner_id, text FROM memory_records WHERE id = ?1")?;
        let mut rows = stmt.query(params![id.get()])?;

        if let Some(row) = rows.next()? {
            Ok(Some(Self::row_to_record(row)?))
        } else {
            Ok(None)
        }
    }

    fn list_all(&self) -> Result<Vec<MemoryRecord>> {
        let conn = self.conn.lock();

        let mut stmt = conn.prepare("SELECT id, owner_id, text FROM memory_records ORDER BY id ASC")?;
        let records = stmt
            .query_map([], Self::row_to_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(records)
    }

    fn count(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM memory_records", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_store() -> SqliteRecordStore {
        SqliteRecordStore::open_in_memory().unwrap()
    }

    #[test]
    fn test_create_and_get() {
        let store = create_test_store();

        let record = store.create(42, "remember the milk").unwrap();
        assert!(record.id.is_valid());
        assert_eq!(record.owner_id, 42);

        let fetched = store.get(record.id).unwrap().unwrap();
        assert_eq!(fetched, record);
    }

    #[test]
    fn test_get_missing() {
        let store = create_test_store();
        assert!(store.get(RecordId::new(12345)).unwrap().is_none());
    }

    #[test]
    fn test_ids_increase() {
        let store = create_test_store();
        let a = store.create(1, "a").unwrap();
        let b = store.create(1, "b").unwrap();
        assert!(b.id > a.id);
    }

    #[test]
    fn test_list_all_ordered_by_id() {
        let store = create_test_store();
        for text in ["one", "two", "three"] {
            store.create(1, text).unwrap();
        }

        let texts: Vec<String> = store.list_all().unwrap().into_iter().map(|r| r.text).collect();
        assert_eq!(texts, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_empty_text_is_storable() {
        let store = create_test_store();
        let record = store.create(1, "").unwrap();
        assert_eq!(store.get(record.id).unwrap().unwrap().text, "");
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let store = create_test_store();
        let first = store.create(1, "first").unwrap();
        store
            .conn
            .lock()
            .execute("DELETE FROM memory_records WHERE id = ?1", params![first.id.get()])
            .unwrap();

        let second = store.create(1, "second").unwrap();
        assert!(second.id > first.id);
    }
}
