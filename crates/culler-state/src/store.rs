//! StateStore — redb-backed state persistence for Culler.
//!
//! Provides typed operations over gate records and published schedules.
//! All values are JSON-serialized into redb's `&[u8]` value columns. The
//! store supports both on-disk and in-memory backends (the latter for
//! testing).

use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use culler_core::{Schedule, SelectionGroup};
use redb::{Database, DatabaseError, ReadableDatabase, ReadableTable};
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::tables::*;
use crate::types::*;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Thread-safe state store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Open (or create) a persistent state store at the given path.
    ///
    /// Fails with `StateError::Locked` if another process holds the file.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(|e| match e {
            DatabaseError::DatabaseAlreadyOpen => StateError::Locked(path.display().to_string()),
            other => StateError::Open(other.to_string()),
        })?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "state store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory state store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory state store opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(GATES).map_err(map_err!(Table))?;
        txn.open_table(SCHEDULES).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    // ── Gate records ───────────────────────────────────────────────

    /// Current record for a group; a fresh version-0 record if it never fired.
    pub fn gate_record(&self, group: &SelectionGroup) -> StateResult<GateRecord> {
        let key = group.table_key();
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(GATES).map_err(map_err!(Table))?;
        match table.get(key.as_str()).map_err(map_err!(Read))? {
            Some(guard) => serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize)),
            None => Ok(GateRecord::new(group.clone())),
        }
    }

    /// Write `record` if the stored version still equals `record.version`.
    ///
    /// The version check and the write share one write transaction. On
    /// success the stored record carries `record.version + 1` and is
    /// returned; otherwise nothing is written and `StateError::Conflict`
    /// is returned.
    pub fn commit_gate(&self, record: &GateRecord) -> StateResult<GateRecord> {
        let key = record.table_key();
        let mut next = record.clone();
        next.version = record.version + 1;

        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(GATES).map_err(map_err!(Table))?;
            let found = match table.get(key.as_str()).map_err(map_err!(Read))? {
                Some(guard) => {
                    let stored: GateRecord =
                        serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                    stored.version
                }
                None => 0,
            };
            if found != record.version {
                debug!(%key, expected = record.version, found, "gate commit conflict");
                // Dropping the transaction without commit aborts it.
                return Err(StateError::Conflict {
                    key,
                    expected: record.version,
                    found,
                });
            }
            let value = serde_json::to_vec(&next).map_err(map_err!(Serialize))?;
            table
                .insert(key.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%key, version = next.version, "gate record committed");
        Ok(next)
    }

    /// List all gate records.
    pub fn list_gate_records(&self) -> StateResult<Vec<GateRecord>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(GATES).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let record: GateRecord =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            results.push(record);
        }
        Ok(results)
    }

    // ── Schedules ──────────────────────────────────────────────────

    /// Publish the schedule for a local date, replacing any earlier one.
    pub fn put_schedule(&self, date: NaiveDate, schedule: &Schedule) -> StateResult<()> {
        let key = schedule_key(date);
        let value = serde_json::to_vec(schedule).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(SCHEDULES).map_err(map_err!(Table))?;
            table
                .insert(key.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%key, entries = schedule.len(), "schedule stored");
        Ok(())
    }

    /// The schedule published for a local date, if any.
    pub fn get_schedule(&self, date: NaiveDate) -> StateResult<Option<Schedule>> {
        let key = schedule_key(date);
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(SCHEDULES).map_err(map_err!(Table))?;
        match table.get(key.as_str()).map_err(map_err!(Read))? {
            Some(guard) => {
                let schedule: Schedule =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(schedule))
            }
            None => Ok(None),
        }
    }
}

fn schedule_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
