//! Data points: the content of an event in the strictest sense.
//!
//! A data point is a labeled measurement, a labeled decision or a labeled
//! action. It says nothing about when or where it happened; that belongs to
//! the row wrapping it.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::value::Value;

/// An immutable `(label, value, unit)` triple.
///
/// # Examples
///
/// ```
/// use mgp::{DataPoint, Value};
///
/// let point = DataPoint::new("temperature", 72.5, "F");
/// assert_eq!(point.label(), "temperature");
/// assert_eq!(point.value(), &Value::Float(72.5));
/// assert_eq!(point.unit(), "F");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    label: String,
    value: Value,
    unit: String,
}

impl DataPoint {
    /// Creates a data point. Construction always succeeds.
    #[must_use]
    pub fn new(label: impl Into<String>, value: impl Into<Value>, unit: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            unit: unit.into(),
        }
    }

    /// Creates a data point, rejecting a blank label.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyLabel` if the label is empty after trimming.
    pub fn try_new(
        label: impl Into<String>,
        value: impl Into<Value>,
        unit: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let point = Self::new(label, value, unit);
        if point.label.trim().is_empty() {
            return Err(ValidationError::EmptyLabel);
        }
        Ok(point)
    }

    /// Creates a unit-less data point (an event or an action).
    #[must_use]
    pub fn event(label: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(label, value, String::new())
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.value
    }

    #[must_use]
    pub fn unit(&self) -> &str {
        &self.unit
    }

    #[must_use]
    pub fn is_unitless(&self) -> bool {
        self.unit.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors_return_supplied_values() {
        let point = DataPoint::new("heart_rate", 61, "bpm");
        assert_eq!(point.label(), "heart_rate");
        assert_eq!(point.value(), &Value::Int(61));
        assert_eq!(point.unit(), "bpm");
        assert!(!point.is_unitless());
    }

    #[test]
    fn test_equality_is_by_content() {
        let a = DataPoint::new("spo2", 98.0, "%");
        let b = DataPoint::new("spo2".to_string(), Value::Float(98.0), "%".to_string());
        assert_eq!(a, b);
        assert_ne!(a, DataPoint::new("spo2", 97.0, "%"));
    }

    #[test]
    fn test_empty_label_allowed_by_plain_constructor() {
        let point = DataPoint::new("", Value::Null, "");
        assert_eq!(point.label(), "");
    }

    #[test]
    fn test_try_new_rejects_blank_label() {
        assert_eq!(
            DataPoint::try_new("   ", 1, "V").unwrap_err(),
            ValidationError::EmptyLabel
        );
        assert!(DataPoint::try_new("voltage", 1, "V").is_ok());
    }

    #[test]
    fn test_event_is_unitless() {
        let action = DataPoint::event("valve", "open");
        assert!(action.is_unitless());
        assert_eq!(action.value().as_string(), Some("open"));
    }
}
