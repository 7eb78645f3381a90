use serde::Serialize;

use crate::error::{MgpResult, StateError};
use crate::row::{Finalization, Row};

use super::traits::{RecordStore, StorageError};

/// Filter/persistence stage for one row.
///
/// A rejected row is finalized as filtered without touching the store. An
/// accepted row is stored, then the stored record is replaced with the
/// finalized snapshot carrying the new id, and only then is the row itself
/// finalized. If any store call fails the row stays pending, the partial
/// record is removed, and the error is returned.
///
/// # Errors
///
/// Returns `StateError::AlreadyFinalized` for a row that is already final
/// (the store is not called), or the storage error.
///
/// # Examples
///
/// ```
/// use mgp::storage::{commit, InMemoryRecordStore};
/// use mgp::{DataPoint, EventRow, Finalization, RecordStore, Row, RowLevel};
///
/// let store = InMemoryRecordStore::new();
/// let point = DataPoint::new("temperature", 36.6, "C");
/// let mut row = EventRow::now(point, 17, "sensor_reading").unwrap();
///
/// let outcome = commit(&store, &mut row, true).unwrap();
/// assert!(matches!(outcome, Finalization::Stored(_)));
/// assert_eq!(row.id(), 0);
///
/// let record = store.read(RowLevel::L0, row.record_id().unwrap()).unwrap().unwrap();
/// let stored: EventRow = serde_json::from_value(record).unwrap();
/// assert_eq!(stored.id(), 0);
/// assert!(stored.is_finalized());
/// ```
pub fn commit<R>(store: &dyn RecordStore, row: &mut R, accepted: bool) -> MgpResult<Finalization>
where
    R: Row + Serialize + Clone,
{
    let state = row.state();
    if state.is_final() {
        return Err(StateError::AlreadyFinalized {
            level: row.level(),
            state,
        }
        .into());
    }

    let outcome = if accepted {
        persist(store, row)?
    } else {
        Finalization::Filtered
    };
    row.finalize(outcome)?;
    Ok(outcome)
}

fn persist<R>(store: &dyn RecordStore, row: &R) -> MgpResult<Finalization>
where
    R: Row + Serialize + Clone,
{
    let level = row.level();
    let pending = serde_json::to_value(row).map_err(StorageError::from)?;
    let id = store.create(level, pending).map_err(|err| {
        tracing::warn!(%level, error = %err, "row persistence failed; row left pending");
        err
    })?;

    let outcome = Finalization::Stored(id);
    let mut staged = row.clone();
    staged.finalize(outcome)?;
    let written = serde_json::to_value(&staged)
        .map_err(StorageError::from)
        .and_then(|record| store.update(level, id, record));
    if let Err(err) = written {
        tracing::warn!(
            %level,
            %id,
            error = %err,
            "finalized snapshot not written; row left pending"
        );
        if let Err(cleanup) = store.delete(level, id) {
            tracing::warn!(%level, %id, error = %cleanup, "partial record not removed");
        }
        return Err(err.into());
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataPoint;
    use crate::row::{EventRow, RecordId, ResponseRow, RowLevel, RowState};
    use crate::storage::InMemoryRecordStore;
    use chrono::Utc;
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingStore {
        creates: AtomicUsize,
        updates: AtomicUsize,
        deletes: AtomicUsize,
        fail_create: bool,
        fail_update: bool,
    }

    impl RecordStore for CountingStore {
        fn create(&self, _level: RowLevel, _record: Value) -> Result<RecordId, StorageError> {
            let n = self.creates.fetch_add(1, Ordering::SeqCst);
            if self.fail_create {
                Err(StorageError::ConnectionError("db down".to_string()))
            } else {
                Ok(RecordId::new(100 + n as u64))
            }
        }

        fn read(&self, _level: RowLevel, _id: RecordId) -> Result<Option<Value>, StorageError> {
            Ok(None)
        }

        fn update(
            &self,
            _level: RowLevel,
            _id: RecordId,
            _record: Value,
        ) -> Result<(), StorageError> {
            self.updates.fetch_add(1, Ordering::SeqCst);
            if self.fail_update {
                Err(StorageError::ConnectionError("db went away".to_string()))
            } else {
                Ok(())
            }
        }

        fn delete(&self, _level: RowLevel, _id: RecordId) -> Result<(), StorageError> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn event() -> EventRow {
        EventRow::new(Utc::now(), DataPoint::new("spo2", 97, "%"), 3, "sensor_reading").unwrap()
    }

    #[test]
    fn test_rejected_row_never_reaches_store() {
        let store = CountingStore::default();
        let mut row = event();
        assert_eq!(commit(&store, &mut row, false).unwrap(), Finalization::Filtered);
        assert!(row.is_filtered());
        assert_eq!(row.id(), -1);
        assert_eq!(store.creates.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_stored_record_is_the_finalized_row() {
        let store = InMemoryRecordStore::new();
        let mut row = event();
        let outcome = commit(&store, &mut row, true).unwrap();
        assert_eq!(outcome, Finalization::Stored(RecordId::new(0)));
        assert_eq!(row.record_id(), Some(RecordId::new(0)));

        let stored = store.read(RowLevel::L0, RecordId::new(0)).unwrap().unwrap();
        assert_eq!(stored["equipment_id"], 3);
        assert_eq!(stored["lifecycle"], serde_json::json!({"state": "accepted", "id": 0}));

        let mut back: EventRow = serde_json::from_value(stored).unwrap();
        assert_eq!(back, row);
        assert_eq!(
            back.consume(999).unwrap_err(),
            StateError::AlreadyFinalized {
                level: RowLevel::L0,
                state: RowState::Accepted(RecordId::new(0)),
            }
        );
    }

    #[test]
    fn test_storage_failure_leaves_row_pending() {
        let store = CountingStore {
            fail_create: true,
            ..CountingStore::default()
        };
        let mut row = event();
        let err = commit(&store, &mut row, true).unwrap_err();
        assert!(err.is_storage());
        assert!(err.is_retryable());
        assert_eq!(row.state(), RowState::Pending);
        assert!(!row.is_filtered());
    }

    #[test]
    fn test_failed_snapshot_write_removes_record() {
        let store = CountingStore {
            fail_update: true,
            ..CountingStore::default()
        };
        let mut row = event();
        let err = commit(&store, &mut row, true).unwrap_err();
        assert!(err.is_storage());
        assert_eq!(row.state(), RowState::Pending);
        assert_eq!(store.creates.load(Ordering::SeqCst), 1);
        assert_eq!(store.updates.load(Ordering::SeqCst), 1);
        assert_eq!(store.deletes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_final_row_rejected_before_store_call() {
        let store = CountingStore::default();
        let mut row = ResponseRow::new(Utc::now(), RecordId::new(4), "ack");
        commit(&store, &mut row, true).unwrap();
        assert_eq!(store.creates.load(Ordering::SeqCst), 1);

        let err = commit(&store, &mut row, true).unwrap_err();
        assert!(err.is_state());
        assert_eq!(store.creates.load(Ordering::SeqCst), 1);
        assert_eq!(row.record_id(), Some(RecordId::new(100)));
    }
}
