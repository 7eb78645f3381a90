//! Level 2 rows: the two channel inputs behind a gate decision.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::data::DataPoint;
use crate::error::ValidationError;
use crate::value::Value;

use super::{impl_row, Lifecycle, RecordId};

/// Input channel of a gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Channel 1: data coming out of processing.
    Processed,
    /// Channel 2: automation (timer driven) data.
    Automated,
}

impl Channel {
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::Processed => 1,
            Self::Automated => 2,
        }
    }
}

impl TryFrom<u8> for Channel {
    type Error = ValidationError;

    fn try_from(channel: u8) -> Result<Self, Self::Error> {
        match channel {
            1 => Ok(Self::Processed),
            2 => Ok(Self::Automated),
            _ => Err(ValidationError::UnsupportedChannel { channel }),
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Processed => write!(f, "processed"),
            Self::Automated => write!(f, "automated"),
        }
    }
}

/// A second level record.
///
/// Either channel may be empty when that side of the gate had nothing to
/// say during the cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateRow {
    timestamp: DateTime<Utc>,
    processed: Option<DataPoint>,
    automated: Option<DataPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    l1_id: Option<RecordId>,
    lifecycle: Lifecycle,
}

impl GateRow {
    #[must_use]
    pub fn new(
        timestamp: DateTime<Utc>,
        processed: Option<DataPoint>,
        automated: Option<DataPoint>,
    ) -> Self {
        Self {
            timestamp,
            processed,
            automated,
            l1_id: None,
            lifecycle: Lifecycle::new(),
        }
    }

    /// Links the row to the L1 record its flow is inherited from.
    #[must_use]
    pub fn with_l1(mut self, l1_id: RecordId) -> Self {
        self.l1_id = Some(l1_id);
        self
    }

    #[must_use]
    pub const fn l1_id(&self) -> Option<RecordId> {
        self.l1_id
    }

    #[must_use]
    pub const fn data(&self, channel: Channel) -> Option<&DataPoint> {
        match channel {
            Channel::Processed => self.processed.as_ref(),
            Channel::Automated => self.automated.as_ref(),
        }
    }

    #[must_use]
    pub fn label(&self, channel: Channel) -> Option<&str> {
        self.data(channel).map(DataPoint::label)
    }

    #[must_use]
    pub fn unit(&self, channel: Channel) -> Option<&str> {
        self.data(channel).map(DataPoint::unit)
    }

    #[must_use]
    pub fn value(&self, channel: Channel) -> Option<&Value> {
        self.data(channel).map(DataPoint::value)
    }
}

impl_row!(GateRow, crate::row::RowLevel::L2);
