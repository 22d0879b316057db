//! Persistence accessor over redb.
//!
//! Every public operation runs in exactly one transaction: write operations
//! commit on success and abort on error. Rows are postcard-encoded and keyed
//! by `u64` ids handed out from the `sequences` table.

use redb::{
    backends::InMemoryBackend, Database, MultimapTableDefinition, ReadTransaction, ReadableTable,
    TableDefinition, TableHandle, WriteTransaction,
};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
#[cfg(feature = "profile")]
use std::time::Instant;
use thiserror::Error;

pub type RowTable = TableDefinition<'static, u64, &'static [u8]>;

pub const USERS_TABLE: RowTable = TableDefinition::new("users");
pub const USER_LOGINS_INDEX: TableDefinition<&str, u64> = TableDefinition::new("user_logins");
pub const TASKS_TABLE: RowTable = TableDefinition::new("tasks");
pub const TASK_CATEGORIES: MultimapTableDefinition<u64, u64> =
    MultimapTableDefinition::new("task_categories");
pub const PRIORITIES_TABLE: RowTable = TableDefinition::new("priorities");
pub const CATEGORIES_TABLE: RowTable = TableDefinition::new("categories");
const SEQUENCES: TableDefinition<&str, u64> = TableDefinition::new("sequences");

/// Cheap to clone handle to the store (Arc inside).
#[derive(Clone)]
pub struct DataContext {
    db: Arc<Database>,
}

impl DataContext {
    /// Open (or create) the database file at `path` and make sure every table exists.
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let db = Database::create(path)?;
        DataContext::init(db)
    }

    /// A throwaway store that lives in memory. Used by tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let db = Database::builder().create_with_backend(InMemoryBackend::new())?;
        DataContext::init(db)
    }

    fn init(db: Database) -> Result<Self, StoreError> {
        let txn = db.begin_write()?;
        {
            let _ = txn.open_table(USERS_TABLE)?;
            let _ = txn.open_table(USER_LOGINS_INDEX)?;
            let _ = txn.open_table(TASKS_TABLE)?;
            let _ = txn.open_multimap_table(TASK_CATEGORIES)?;
            let _ = txn.open_table(PRIORITIES_TABLE)?;
            let _ = txn.open_table(CATEGORIES_TABLE)?;
            let _ = txn.open_table(SEQUENCES)?;
        }
        txn.commit()?;
        Ok(DataContext { db: Arc::new(db) })
    }

    /// Run `op` inside a read transaction.
    pub fn read<T>(
        &self,
        op: impl FnOnce(&ReadTransaction) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let txn = self.db.begin_read()?;
        op(&txn)
    }

    /// Run `op` inside a write transaction. Commits when `op` succeeds,
    /// aborts (rolls back) when it fails.
    pub fn tx<T>(
        &self,
        op: impl FnOnce(&WriteTransaction) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        #[cfg(feature = "profile")]
        let started = Instant::now();
        let txn = self.db.begin_write()?;
        match op(&txn) {
            Ok(value) => {
                txn.commit()?;
                #[cfg(feature = "profile")]
                tracing::debug!(elapsed_us = started.elapsed().as_micros() as u64, "write transaction committed");
                Ok(value)
            }
            Err(e) => {
                txn.abort()?;
                #[cfg(feature = "profile")]
                tracing::debug!(elapsed_us = started.elapsed().as_micros() as u64, "write transaction aborted");
                Err(e)
            }
        }
    }

    /// Single row by id.
    pub fn optional<R: DeserializeOwned>(&self, table: RowTable, id: u64) -> Result<Option<R>, StoreError> {
        self.read(|txn| {
            let rows = txn.open_table(table)?;
            get_row(&rows, id)
        })
    }

    /// Every row of `table` accepted by `filter`, in id order.
    pub fn query<R: DeserializeOwned>(
        &self,
        table: RowTable,
        filter: impl Fn(&R) -> bool,
    ) -> Result<Vec<R>, StoreError> {
        self.read(|txn| {
            let rows = txn.open_table(table)?;
            scan_rows(&rows, filter)
        })
    }

    /// Insert a new row. `build` receives the freshly allocated id.
    pub fn insert<R: Serialize>(
        &self,
        table: RowTable,
        build: impl FnOnce(u64) -> R,
    ) -> Result<R, StoreError> {
        self.tx(|txn| {
            let id = next_id(txn, table.name())?;
            let row = build(id);
            let mut rows = txn.open_table(table)?;
            rows.insert(id, encode(&row)?.as_slice())?;
            Ok(row)
        })
    }

    /// Load, mutate and store a row. Returns false when no row has that id.
    pub fn execute_update<R: Serialize + DeserializeOwned>(
        &self,
        table: RowTable,
        id: u64,
        mutate: impl FnOnce(&mut R),
    ) -> Result<bool, StoreError> {
        self.tx(|txn| {
            let mut rows = txn.open_table(table)?;
            let Some(mut row) = get_row::<R, _>(&rows, id)? else {
                return Ok(false);
            };
            mutate(&mut row);
            rows.insert(id, encode(&row)?.as_slice())?;
            Ok(true)
        })
    }

    /// Remove a row. Returns whether it existed.
    pub fn delete(&self, table: RowTable, id: u64) -> Result<bool, StoreError> {
        self.tx(|txn| {
            let mut rows = txn.open_table(table)?;
            let removed = rows.remove(id)?.is_some();
            Ok(removed)
        })
    }

    /// Number of rows in `table`.
    pub fn count(&self, table: RowTable) -> Result<u64, StoreError> {
        self.read(|txn| {
            let rows = txn.open_table(table)?;
            let mut count = 0;
            for entry in rows.iter()? {
                entry?;
                count += 1;
            }
            Ok(count)
        })
    }
}

// ── Row helpers (usable inside any transaction) ────────────────

pub fn get_row<R, T>(table: &T, id: u64) -> Result<Option<R>, StoreError>
where
    R: DeserializeOwned,
    T: ReadableTable<u64, &'static [u8]>,
{
    match table.get(id)? {
        Some(data) => Ok(Some(decode(data.value())?)),
        None => Ok(None),
    }
}

pub fn scan_rows<R, T>(table: &T, filter: impl Fn(&R) -> bool) -> Result<Vec<R>, StoreError>
where
    R: DeserializeOwned,
    T: ReadableTable<u64, &'static [u8]>,
{
    let mut found = Vec::new();
    for entry in table.iter()? {
        let (_, value) = entry?;
        let row: R = decode(value.value())?;
        if filter(&row) {
            found.push(row);
        }
    }
    Ok(found)
}

/// Allocate the next id of a sequence. Ids start at 1.
pub fn next_id(txn: &WriteTransaction, sequence: &str) -> Result<u64, StoreError> {
    let mut sequences = txn.open_table(SEQUENCES)?;
    let current = sequences.get(sequence)?.map(|v| v.value()).unwrap_or(0);
    let next = current + 1;
    sequences.insert(sequence, next)?;
    Ok(next)
}

pub fn encode<R: Serialize>(row: &R) -> Result<Vec<u8>, StoreError> {
    postcard::to_allocvec(row).map_err(|e| StoreError::Encode(e.to_string()))
}

pub fn decode<R: DeserializeOwned>(bytes: &[u8]) -> Result<R, StoreError> {
    postcard::from_bytes(bytes).map_err(|e| StoreError::Decode(e.to_string()))
}

// ── Errors ─────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("redb: {0}")]
    Redb(String),

    #[error("decode: {0}")]
    Decode(String),

    #[error("encode: {0}")]
    Encode(String),

    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),
}

// redb 2.x has many error types. Blanket them all into StoreError::Redb.
macro_rules! from_redb {
    ($($t:ty),*) => {
        $(impl From<$t> for StoreError {
            fn from(e: $t) -> Self { StoreError::Redb(e.to_string()) }
        })*
    };
}

from_redb!(
    redb::Error,
    redb::DatabaseError,
    redb::TableError,
    redb::TransactionError,
    redb::StorageError,
    redb::CommitError
);

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Row {
        id: u64,
        label: String,
    }

    const ROWS: RowTable = TableDefinition::new("categories");

    #[test]
    fn insert_assigns_increasing_ids() {
        let ctx = DataContext::open_in_memory().unwrap();
        let a = ctx.insert(ROWS, |id| Row { id, label: "a".into() }).unwrap();
        let b = ctx.insert(ROWS, |id| Row { id, label: "b".into() }).unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(ctx.count(ROWS).unwrap(), 2);
    }

    #[test]
    fn optional_returns_none_for_unknown_id() {
        let ctx = DataContext::open_in_memory().unwrap();
        let row: Option<Row> = ctx.optional(ROWS, 42).unwrap();
        assert!(row.is_none());
    }

    #[test]
    fn query_filters_rows() {
        let ctx = DataContext::open_in_memory().unwrap();
        for label in ["keep", "drop", "keep"] {
            ctx.insert(ROWS, |id| Row { id, label: label.into() }).unwrap();
        }
        let kept: Vec<Row> = ctx.query(ROWS, |r: &Row| r.label == "keep").unwrap();
        assert_eq!(kept.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn execute_update_and_delete_report_affected_rows() {
        let ctx = DataContext::open_in_memory().unwrap();
        let row = ctx.insert(ROWS, |id| Row { id, label: "old".into() }).unwrap();

        assert!(ctx.execute_update(ROWS, row.id, |r: &mut Row| r.label = "new".into()).unwrap());
        assert!(!ctx.execute_update(ROWS, 99, |r: &mut Row| r.label = "x".into()).unwrap());

        let stored: Row = ctx.optional(ROWS, row.id).unwrap().unwrap();
        assert_eq!(stored.label, "new");

        assert!(ctx.delete(ROWS, row.id).unwrap());
        assert!(!ctx.delete(ROWS, row.id).unwrap());
    }

    #[test]
    fn failed_transaction_is_rolled_back() {
        let ctx = DataContext::open_in_memory().unwrap();
        let result: Result<(), StoreError> = ctx.tx(|txn| {
            let id = next_id(txn, "categories")?;
            let mut rows = txn.open_table(ROWS)?;
            rows.insert(id, encode(&Row { id, label: "ghost".into() })?.as_slice())?;
            Err(StoreError::UniqueViolation("forced".into()))
        });
        assert!(result.is_err());
        assert_eq!(ctx.count(ROWS).unwrap(), 0);

        // The sequence bump was rolled back too
        let row = ctx.insert(ROWS, |id| Row { id, label: "real".into() }).unwrap();
        assert_eq!(row.id, 1);
    }
}
