//! Level 3 rows: responses resulting from a gate decision.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{impl_row, Lifecycle, RecordId};

/// A third level record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseRow {
    timestamp: DateTime<Utc>,
    l2_id: RecordId,
    response: String,
    lifecycle: Lifecycle,
}

impl ResponseRow {
    #[must_use]
    pub fn new(timestamp: DateTime<Utc>, l2_id: RecordId, response: impl Into<String>) -> Self {
        Self {
            timestamp,
            l2_id,
            response: response.into(),
            lifecycle: Lifecycle::new(),
        }
    }

    /// The L2 record this response resulted from.
    #[must_use]
    pub const fn l2_id(&self) -> RecordId {
        self.l2_id
    }

    #[must_use]
    pub fn response(&self) -> &str {
        &self.response
    }
}

impl_row!(ResponseRow, crate::row::RowLevel::L3);
