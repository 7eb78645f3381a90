//! Abstract storage contract for MGP records.
//!
//! Rows cross the seam as `serde_json::Value` so a backend never depends on
//! the row types. Ids are assigned by the backend, one sequence per level.

use thiserror::Error;

use crate::row::{RecordId, RowLevel};

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Record not found.
    #[error("Record not found: {level} #{id}")]
    RecordNotFound {
        level: RowLevel,
        id: RecordId,
    },

    /// Backend error.
    #[error("Storage backend error: {0}")]
    BackendError(String),

    /// Serialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Connection failed.
    #[error("Connection error: {0}")]
    ConnectionError(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

/// CRUD over the four row levels.
///
/// # Safety Considerations
/// - `create` must assign each id at most once per level
/// - Implementations should handle concurrent access safely
pub trait RecordStore: Send + Sync {
    /// Persist a new record and return its id.
    ///
    /// # Errors
    ///
    /// Returns the backend's error; no id is consumed on failure.
    fn create(&self, level: RowLevel, record: serde_json::Value) -> Result<RecordId, StorageError>;

    /// Get a record by id.
    ///
    /// # Errors
    ///
    /// Returns the backend's error. A missing record is `Ok(None)`.
    fn read(&self, level: RowLevel, id: RecordId)
        -> Result<Option<serde_json::Value>, StorageError>;

    /// Replace an existing record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::RecordNotFound` if no record has `id`.
    fn update(
        &self,
        level: RowLevel,
        id: RecordId,
        record: serde_json::Value,
    ) -> Result<(), StorageError>;

    /// Delete a record by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::RecordNotFound` if no record has `id`.
    fn delete(&self, level: RowLevel, id: RecordId) -> Result<(), StorageError>;
}
