//! Level 0 rows: raw events coming from a piece of equipment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::data::DataPoint;
use crate::error::ValidationError;
use crate::value::Value;

use super::{impl_row, Lifecycle};

/// A zero level record: one observed data point, its source equipment and
/// its event classification.
///
/// # Examples
///
/// ```
/// use mgp::{DataPoint, EventRow, Row};
///
/// let data = DataPoint::new("temperature", 72.5, "F");
/// let mut row = EventRow::now(data, 17, "sensor_reading").unwrap();
/// assert_eq!(row.id(), -1);
///
/// row.consume(4031).unwrap();
/// assert_eq!(row.id(), 4031);
/// assert!(!row.is_filtered());
/// assert!(row.consume(4032).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "EventRecord")]
pub struct EventRow {
    timestamp: DateTime<Utc>,
    data: DataPoint,
    equipment_id: u32,
    event_type: String,
    lifecycle: Lifecycle,
}

/// Wire form of [`EventRow`]; validated on the way in.
#[derive(Deserialize)]
struct EventRecord {
    timestamp: DateTime<Utc>,
    data: DataPoint,
    equipment_id: u32,
    event_type: String,
    lifecycle: Lifecycle,
}

impl TryFrom<EventRecord> for EventRow {
    type Error = ValidationError;

    fn try_from(record: EventRecord) -> Result<Self, Self::Error> {
        let mut row = Self::new(
            record.timestamp,
            record.data,
            record.equipment_id,
            record.event_type,
        )?;
        row.lifecycle = record.lifecycle;
        Ok(row)
    }
}

impl EventRow {
    /// Creates a pending row.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidEquipmentId` for equipment id `0`.
    pub fn new(
        timestamp: DateTime<Utc>,
        data: DataPoint,
        equipment_id: u32,
        event_type: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        if equipment_id == 0 {
            return Err(ValidationError::InvalidEquipmentId { value: equipment_id });
        }
        Ok(Self {
            timestamp,
            data,
            equipment_id,
            event_type: event_type.into(),
            lifecycle: Lifecycle::new(),
        })
    }

    /// Creates a pending row stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidEquipmentId` for equipment id `0`.
    pub fn now(
        data: DataPoint,
        equipment_id: u32,
        event_type: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        Self::new(Utc::now(), data, equipment_id, event_type)
    }

    #[must_use]
    pub const fn equipment(&self) -> u32 {
        self.equipment_id
    }

    #[must_use]
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    #[must_use]
    pub const fn data(&self) -> &DataPoint {
        &self.data
    }

    #[must_use]
    pub fn label(&self) -> &str {
        self.data.label()
    }

    #[must_use]
    pub fn unit(&self) -> &str {
        self.data.unit()
    }

    #[must_use]
    pub const fn value(&self) -> &Value {
        self.data.value()
    }
}

impl_row!(EventRow, crate::row::RowLevel::L0);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StateError;
    use crate::row::{Finalization, RecordId, Row, RowLevel, RowState};

    fn sample() -> EventRow {
        let point = DataPoint::new("temperature", 72.5, "F");
        EventRow::new(Utc::now(), point, 17, "sensor_reading").unwrap()
    }

    #[test]
    fn test_new_row_is_pending() {
        let row = sample();
        assert_eq!(row.state(), RowState::Pending);
        assert_eq!(row.id(), -1);
        assert!(!row.is_filtered());
        assert!(!row.is_finalized());
        assert_eq!(row.level(), RowLevel::L0);
    }

    #[test]
    fn test_accessors_delegate_to_data() {
        let ts = Utc::now();
        let point = DataPoint::new("pressure", 101, "kPa");
        let row = EventRow::new(ts, point, 3, "sensor_reading").unwrap();
        assert_eq!(row.timestamp(), ts);
        assert_eq!(row.equipment(), 3);
        assert_eq!(row.event_type(), "sensor_reading");
        assert_eq!(row.label(), "pressure");
        assert_eq!(row.unit(), "kPa");
        assert_eq!(row.value(), &Value::Int(101));
    }

    #[test]
    fn test_zero_equipment_rejected() {
        let err = EventRow::now(DataPoint::event("door", "open"), 0, "action").unwrap_err();
        assert_eq!(err, ValidationError::InvalidEquipmentId { value: 0 });
    }

    #[test]
    fn test_consume_negative_filters() {
        let mut row = sample();
        row.consume(-1).unwrap();
        assert!(row.is_filtered());
        assert_eq!(row.id(), -1);
        assert_eq!(row.record_id(), None);
    }

    #[test]
    fn test_consume_zero_is_a_valid_id() {
        let mut row = sample();
        row.consume(0).unwrap();
        assert!(!row.is_filtered());
        assert_eq!(row.id(), 0);
        assert_eq!(row.record_id(), Some(RecordId::new(0)));
    }

    #[test]
    fn test_second_consume_rejected_and_state_kept() {
        let mut row = sample();
        row.consume(-1).unwrap();
        let err = row.consume(55).unwrap_err();
        assert_eq!(
            err,
            StateError::AlreadyFinalized {
                level: RowLevel::L0,
                state: RowState::Filtered,
            }
        );
        assert!(row.is_filtered());
        assert_eq!(row.id(), -1);
    }

    #[test]
    fn test_finalize_typed_outcome() {
        let mut row = sample();
        row.finalize(Finalization::Stored(RecordId::new(9))).unwrap();
        assert_eq!(row.state(), RowState::Accepted(RecordId::new(9)));
        assert!(row.finalize(Finalization::Stored(RecordId::new(9))).is_err());
    }

    #[test]
    fn test_serialization_keeps_state() {
        let mut row = sample();
        row.consume(12).unwrap();
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["lifecycle"], serde_json::json!({"state": "accepted", "id": 12}));
        let back: EventRow = serde_json::from_value(json).unwrap();
        assert_eq!(back, row);
    }

    #[test]
    fn test_deserialize_rejects_zero_equipment() {
        let mut row = sample();
        row.consume(3).unwrap();
        let mut json = serde_json::to_value(&row).unwrap();
        json["equipment_id"] = serde_json::json!(0);

        let err = serde_json::from_value::<EventRow>(json).unwrap_err();
        assert!(err.to_string().contains("Equipment ID must be positive"));
    }
}
