//! Rows: data points enriched with provenance and a one-shot finalization.
//!
//! Every row is created `Pending` when the fact is observed. The stage that
//! decides filtering and persistence finalizes it exactly once, after which
//! the row is a read-only record of its own fate. Levels follow the flow of
//! the gateway:
//!
//! - **L0** [`EventRow`]: raw equipment events
//! - **L1** [`PatientRow`]: processed data, optionally tied to a patient
//! - **L2** [`GateRow`]: the two gate channels that opened an output
//! - **L3** [`ResponseRow`]: the response produced from a gate decision

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StateError;

/// Implements [`Row`] for a struct with `timestamp` and `lifecycle` fields.
///
/// Debug builds warn when such a row is dropped while still pending.
macro_rules! impl_row {
    ($ty:ty, $level:expr) => {
        impl $crate::row::Row for $ty {
            fn level(&self) -> $crate::row::RowLevel {
                $level
            }

            fn timestamp(&self) -> ::chrono::DateTime<::chrono::Utc> {
                self.timestamp
            }

            fn state(&self) -> $crate::row::RowState {
                self.lifecycle.state()
            }

            fn finalize(
                &mut self,
                outcome: $crate::row::Finalization,
            ) -> Result<(), $crate::error::StateError> {
                self.lifecycle.finalize($level, outcome).map(|_| ())
            }
        }

        impl Drop for $ty {
            fn drop(&mut self) {
                if cfg!(debug_assertions) && !self.lifecycle.state().is_final() {
                    ::tracing::warn!(level = %$level, "row dropped before finalization");
                }
            }
        }
    };
}

pub(crate) use impl_row;

pub mod event;
pub mod gate;
pub mod patient;
pub mod response;

pub use event::EventRow;
pub use gate::{Channel, GateRow};
pub use patient::PatientRow;
pub use response::ResponseRow;

/// Identity assigned to a row by the persistence stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(u64);

impl RecordId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RecordId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl TryFrom<i64> for RecordId {
    type Error = std::num::TryFromIntError;

    fn try_from(id: i64) -> Result<Self, Self::Error> {
        u64::try_from(id).map(Self)
    }
}

/// Storage level of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RowLevel {
    L0,
    L1,
    L2,
    L3,
}

impl RowLevel {
    pub const ALL: [Self; 4] = [Self::L0, Self::L1, Self::L2, Self::L3];

    #[must_use]
    pub const fn index(self) -> u8 {
        match self {
            Self::L0 => 0,
            Self::L1 => 1,
            Self::L2 => 2,
            Self::L3 => 3,
        }
    }
}

impl fmt::Display for RowLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.index())
    }
}

/// Lifecycle state of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "id", rename_all = "snake_case")]
pub enum RowState {
    /// Observed, no decision yet.
    #[default]
    Pending,
    /// Rejected by the filter chain; never persisted.
    Filtered,
    /// Accepted and persisted with this identity.
    Accepted(RecordId),
}

impl RowState {
    #[must_use]
    pub const fn is_final(self) -> bool {
        !matches!(self, Self::Pending)
    }

    #[must_use]
    pub const fn is_filtered(self) -> bool {
        matches!(self, Self::Filtered)
    }

    #[must_use]
    pub const fn record_id(self) -> Option<RecordId> {
        match self {
            Self::Accepted(id) => Some(id),
            Self::Pending | Self::Filtered => None,
        }
    }

    /// The signed id view: `-1` unless accepted.
    ///
    /// Ids above `i64::MAX` saturate.
    #[must_use]
    pub fn legacy_id(self) -> i64 {
        self.record_id()
            .map_or(-1, |id| i64::try_from(id.get()).unwrap_or(i64::MAX))
    }
}

impl fmt::Display for RowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Filtered => write!(f, "filtered"),
            Self::Accepted(id) => write!(f, "accepted as #{id}"),
        }
    }
}

/// The outcome of the filter/persistence decision for one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "id", rename_all = "snake_case")]
pub enum Finalization {
    Filtered,
    Stored(RecordId),
}

impl Finalization {
    /// Interprets a signed persistence result: negative means filtered.
    #[must_use]
    pub fn from_result(result: i64) -> Self {
        RecordId::try_from(result).map_or(Self::Filtered, Self::Stored)
    }

    const fn into_state(self) -> RowState {
        match self {
            Self::Filtered => RowState::Filtered,
            Self::Stored(id) => RowState::Accepted(id),
        }
    }
}

/// The single-fire state cell embedded in every row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Lifecycle {
    state: RowState,
}

impl Lifecycle {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: RowState::Pending,
        }
    }

    #[must_use]
    pub const fn state(&self) -> RowState {
        self.state
    }

    /// Applies the outcome once.
    ///
    /// # Errors
    ///
    /// Returns `StateError::AlreadyFinalized` if a decision was already
    /// applied; the existing state is kept.
    pub fn finalize(
        &mut self,
        level: RowLevel,
        outcome: Finalization,
    ) -> Result<RowState, StateError> {
        if self.state.is_final() {
            return Err(StateError::AlreadyFinalized {
                level,
                state: self.state,
            });
        }
        self.state = outcome.into_state();
        tracing::debug!(%level, state = %self.state, "row finalized");
        Ok(self.state)
    }
}

/// Shared surface of every row level.
///
/// Lifecycle readers are valid in any state; before finalization they
/// report the pending defaults (`id() == -1`, `is_filtered() == false`).
pub trait Row: fmt::Debug + Send + Sync {
    fn level(&self) -> RowLevel;

    /// When the underlying fact was observed.
    fn timestamp(&self) -> DateTime<Utc>;

    fn state(&self) -> RowState;

    /// Applies the filter/persistence decision.
    ///
    /// # Errors
    ///
    /// Returns `StateError::AlreadyFinalized` on any second call.
    fn finalize(&mut self, outcome: Finalization) -> Result<(), StateError>;

    /// Signed entry point: `result < 0` filters the row, `result >= 0` is
    /// the persisted id.
    ///
    /// # Errors
    ///
    /// Returns `StateError::AlreadyFinalized` on any second call.
    fn consume(&mut self, result: i64) -> Result<(), StateError> {
        self.finalize(Finalization::from_result(result))
    }

    fn id(&self) -> i64 {
        self.state().legacy_id()
    }

    fn record_id(&self) -> Option<RecordId> {
        self.state().record_id()
    }

    fn is_filtered(&self) -> bool {
        self.state().is_filtered()
    }

    fn is_finalized(&self) -> bool {
        self.state().is_final()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_result_sign() {
        assert_eq!(Finalization::from_result(-1), Finalization::Filtered);
        assert_eq!(Finalization::from_result(i64::MIN), Finalization::Filtered);
        assert_eq!(Finalization::from_result(0), Finalization::Stored(RecordId::new(0)));
        assert_eq!(Finalization::from_result(4031), Finalization::Stored(RecordId::new(4031)));
    }

    #[test]
    fn test_lifecycle_fires_once() {
        let mut cell = Lifecycle::new();
        assert_eq!(cell.state(), RowState::Pending);

        let state = cell.finalize(RowLevel::L0, Finalization::Stored(RecordId::new(3))).unwrap();
        assert_eq!(state, RowState::Accepted(RecordId::new(3)));

        let err = cell.finalize(RowLevel::L0, Finalization::Filtered).unwrap_err();
        assert_eq!(
            err,
            StateError::AlreadyFinalized {
                level: RowLevel::L0,
                state: RowState::Accepted(RecordId::new(3)),
            }
        );
        assert_eq!(cell.state(), RowState::Accepted(RecordId::new(3)));
    }

    #[test]
    fn test_filtered_cannot_be_stored_later() {
        let mut cell = Lifecycle::new();
        cell.finalize(RowLevel::L2, Finalization::Filtered).unwrap();
        assert!(cell.finalize(RowLevel::L2, Finalization::Stored(RecordId::new(1))).is_err());
        assert_eq!(cell.state(), RowState::Filtered);
    }

    #[test]
    fn test_state_views() {
        assert_eq!(RowState::Pending.legacy_id(), -1);
        assert_eq!(RowState::Filtered.legacy_id(), -1);
        assert_eq!(RowState::Accepted(RecordId::new(12)).legacy_id(), 12);
        assert_eq!(RowState::Accepted(RecordId::new(u64::MAX)).legacy_id(), i64::MAX);
        assert!(!RowState::Pending.is_final());
        assert!(RowState::Filtered.is_filtered());
        assert_eq!(RowState::Filtered.record_id(), None);
    }

    #[test]
    fn test_state_serialization() {
        let json = serde_json::to_value(RowState::Accepted(RecordId::new(5))).unwrap();
        assert_eq!(json, serde_json::json!({"state": "accepted", "id": 5}));
        let pending = serde_json::to_value(RowState::Pending).unwrap();
        assert_eq!(pending, serde_json::json!({"state": "pending"}));
    }

    #[test]
    fn test_level_display() {
        let names: Vec<String> = RowLevel::ALL.iter().map(ToString::to_string).collect();
        assert_eq!(names, ["L0", "L1", "L2", "L3"]);
    }
}
