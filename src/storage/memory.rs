//! In-memory storage backend.
//!
//! Thread-safe implementation of [`RecordStore`], intended for embedded
//! usage, tests, and as a reference implementation.

use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::row::{RecordId, RowLevel};
use crate::storage::traits::{RecordStore, StorageError};

fn lock_err(context: &'static str) -> StorageError {
    StorageError::BackendError(format!("poisoned lock: {context}"))
}

#[derive(Debug, Default)]
struct LevelState {
    next_id: u64,
    records: BTreeMap<RecordId, serde_json::Value>,
}

/// In-memory record store with one id sequence per level, starting at 0.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    levels: [RwLock<LevelState>; 4],
}

impl InMemoryRecordStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn level(&self, level: RowLevel) -> &RwLock<LevelState> {
        &self.levels[usize::from(level.index())]
    }

    /// Number of records currently held at `level`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::BackendError` if the level lock is poisoned.
    pub fn len(&self, level: RowLevel) -> Result<usize, StorageError> {
        let state = self.level(level).read().map_err(|_| lock_err("record.len"))?;
        Ok(state.records.len())
    }

    /// True when no level holds a record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::BackendError` if any level lock is poisoned.
    pub fn is_empty(&self) -> Result<bool, StorageError> {
        for level in RowLevel::ALL {
            if self.len(level)? > 0 {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Ids held at `level`, ascending.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::BackendError` if the level lock is poisoned.
    pub fn ids(&self, level: RowLevel) -> Result<Vec<RecordId>, StorageError> {
        let state = self.level(level).read().map_err(|_| lock_err("record.ids"))?;
        Ok(state.records.keys().copied().collect())
    }
}

impl RecordStore for InMemoryRecordStore {
    fn create(&self, level: RowLevel, record: serde_json::Value) -> Result<RecordId, StorageError> {
        let mut state = self.level(level).write().map_err(|_| lock_err("record.create"))?;
        let id = RecordId::new(state.next_id);
        state.next_id = state
            .next_id
            .checked_add(1)
            .ok_or_else(|| StorageError::BackendError(format!("{level} id sequence exhausted")))?;
        state.records.insert(id, record);
        Ok(id)
    }

    fn read(
        &self,
        level: RowLevel,
        id: RecordId,
    ) -> Result<Option<serde_json::Value>, StorageError> {
        let state = self.level(level).read().map_err(|_| lock_err("record.read"))?;
        Ok(state.records.get(&id).cloned())
    }

    fn update(
        &self,
        level: RowLevel,
        id: RecordId,
        record: serde_json::Value,
    ) -> Result<(), StorageError> {
        let mut state = self.level(level).write().map_err(|_| lock_err("record.update"))?;
        let slot = state
            .records
            .get_mut(&id)
            .ok_or(StorageError::RecordNotFound { level, id })?;
        *slot = record;
        Ok(())
    }

    fn delete(&self, level: RowLevel, id: RecordId) -> Result<(), StorageError> {
        let mut state = self.level(level).write().map_err(|_| lock_err("record.delete"))?;
        state
            .records
            .remove(&id)
            .map(|_| ())
            .ok_or(StorageError::RecordNotFound { level, id })
    }
}
