//! Error types for MGP.
//!
//! All errors are strongly typed using thiserror so callers can pattern
//! match on the exact condition. Errors here are local and synchronous:
//! they are detected at the offending call and never swallowed.

use thiserror::Error;

use crate::dispatch::Flow;
use crate::row::{RowLevel, RowState};
use crate::storage::StorageError;

/// Validation errors raised by hardened constructors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Data point label cannot be empty")]
    EmptyLabel,

    #[error("Equipment ID must be positive, got {value}")]
    InvalidEquipmentId {
        value: u32,
    },

    #[error("Channel {channel} is not supported (expected 1 or 2)")]
    UnsupportedChannel {
        channel: u8,
    },

    #[error("Gate logic '{logic}' at label '{label}' is not valid or not implemented")]
    UnknownGateLogic {
        label: String,
        logic: String,
    },
}

/// Lifecycle errors: an operation was invoked in a state that forbids it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("{level} row is already finalized ({state})")]
    AlreadyFinalized {
        level: RowLevel,
        state: RowState,
    },
}

/// Errors raised by a single flow sink.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("{flow} sink is full (capacity: {capacity})")]
    QueueFull {
        flow: Flow,
        capacity: usize,
    },

    #[error("{flow} sink is disconnected")]
    Disconnected {
        flow: Flow,
    },

    #[error("{flow} sink rejected payload: {reason}")]
    Rejected {
        flow: Flow,
        reason: String,
    },
}

impl DispatchError {
    /// The flow whose sink failed.
    #[must_use]
    pub const fn flow(&self) -> Flow {
        match self {
            Self::QueueFull { flow, .. }
            | Self::Disconnected { flow }
            | Self::Rejected { flow, .. } => *flow,
        }
    }
}

/// Handler registry errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Handler '{name}' is already registered")]
    DuplicateHandler {
        name: String,
    },

    #[error("Handler '{name}' is not registered")]
    UnknownHandler {
        name: String,
    },
}

/// Top-level error type for MGP.
#[derive(Debug, Error)]
pub enum MgpError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid state: {0}")]
    State(#[from] StateError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl MgpError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true for double finalization and other lifecycle misuse.
    #[must_use]
    pub const fn is_state(&self) -> bool {
        matches!(self, Self::State(_))
    }

    #[must_use]
    pub const fn is_dispatch(&self) -> bool {
        matches!(self, Self::Dispatch(_))
    }

    #[must_use]
    pub const fn is_registry(&self) -> bool {
        matches!(self, Self::Registry(_))
    }

    #[must_use]
    pub const fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }

    /// Returns true if retrying the same call may succeed.
    ///
    /// Retries belong to the dispatch and persistence collaborators; nothing
    /// about a row's lifecycle changes on retry.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Dispatch(e) => matches!(e, DispatchError::QueueFull { .. }),
            Self::Storage(e) => matches!(e, StorageError::ConnectionError(_)),
            Self::Validation(_)
            | Self::State(_)
            | Self::Registry(_)
            | Self::Internal { .. } => false,
        }
    }
}

/// Result type alias for MGP operations.
pub type MgpResult<T> = Result<T, MgpError>;
