//! StateStore: Redb-backed persistence for the install and task timers.
//!
//! Supports both on-disk and in-memory backends (the latter for testing).

use std::path::Path;
use std::sync::Arc;

use hawk_core::Install;
use redb::{Database, ReadableDatabase, ReadableTable};
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::tables::*;
use crate::types::TaskTimerEntry;

/// redb errors all collapse into `StateError::Storage`.
fn storage(e: impl std::fmt::Display) -> StateError {
    StateError::Storage(e.to_string())
}

fn encode<T: serde::Serialize>(record: &'static str, value: &T) -> StateResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| StateError::Encode {
        record,
        reason: e.to_string(),
    })
}

fn decode<T: serde::de::DeserializeOwned>(record: &'static str, bytes: &[u8]) -> StateResult<T> {
    serde_json::from_slice(bytes).map_err(|e| StateError::Corrupt {
        record,
        reason: e.to_string(),
    })
}

type Table = redb::TableDefinition<'static, &'static str, &'static [u8]>;

/// Thread-safe state store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Open (or create) a persistent state store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(|e| StateError::Open(format!("{}: {e}", path.display())))?;
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
            .map_err(|e| StateError::Open(e.to_string()))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory state store opened");
        Ok(store)
    }

    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(storage)?;
        txn.open_table(INSTALL).map_err(storage)?;
        txn.open_table(TASK_TIMERS).map_err(storage)?;
        txn.commit().map_err(storage)?;
        Ok(())
    }

    fn put(&self, table: Table, key: &str, value: &[u8]) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(storage)?;
        {
            let mut table = txn.open_table(table).map_err(storage)?;
            table.insert(key, value).map_err(storage)?;
        }
        txn.commit().map_err(storage)?;
        Ok(())
    }

    fn get(&self, table: Table, key: &str) -> StateResult<Option<Vec<u8>>> {
        let txn = self.db.begin_read().map_err(storage)?;
        let table = txn.open_table(table).map_err(storage)?;
        Ok(table
            .get(key)
            .map_err(storage)?
            .map(|guard| guard.value().to_vec()))
    }

    // ── Install ────────────────────────────────────────────────────

    /// Store the install record, replacing any previous one.
    pub fn put_install(&self, install: &Install) -> StateResult<()> {
        let value = encode("install", install)?;
        self.put(INSTALL, INSTALL_KEY, &value)?;
        debug!(install_id = %install.install_id, "install stored");
        Ok(())
    }

    pub fn get_install(&self) -> StateResult<Option<Install>> {
        self.get(INSTALL, INSTALL_KEY)?
            .map(|bytes| decode("install", &bytes))
            .transpose()
    }

    // ── Task timers ────────────────────────────────────────────────

    pub fn put_task_timer(&self, entry: &TaskTimerEntry) -> StateResult<()> {
        let value = encode("task timer", entry)?;
        self.put(TASK_TIMERS, &entry.task, &value)?;
        debug!(task = %entry.task, last_fired_at = %entry.last_fired_at, "task timer stored");
        Ok(())
    }

    pub fn list_task_timers(&self) -> StateResult<Vec<TaskTimerEntry>> {
        let txn = self.db.begin_read().map_err(storage)?;
        let table = txn.open_table(TASK_TIMERS).map_err(storage)?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(storage)? {
            let (_, value) = entry.map_err(storage)?;
            results.push(decode("task timer", value.value())?);
        }
        Ok(results)
    }
}
