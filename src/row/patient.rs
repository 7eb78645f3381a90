//! Level 1 rows: processed data, optionally bound to a patient.
//!
//! The patient identity is only handed out to callers presenting the same
//! password (or the same absence of one) that was supplied at construction.
//! Only a BLAKE3 digest of the password is kept.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::data::DataPoint;
use crate::value::Value;

use super::{impl_row, Lifecycle, RecordId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct PatientBinding {
    patient_id: u64,
    /// Hex BLAKE3 digest; `None` when no password was configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    password_digest: Option<String>,
}

impl PatientBinding {
    fn new(patient_id: u64, password: Option<&str>) -> Self {
        Self {
            patient_id,
            password_digest: password.map(|p| blake3::hash(p.as_bytes()).to_hex().to_string()),
        }
    }

    fn unlock(&self, password: Option<&str>) -> Option<u64> {
        let matches = match (&self.password_digest, password) {
            (None, None) => true,
            (Some(stored), Some(given)) => {
                // Constant-time comparison via blake3::Hash equality.
                blake3::Hash::from_hex(stored).is_ok_and(|h| h == blake3::hash(given.as_bytes()))
            }
            _ => false,
        };
        matches.then_some(self.patient_id)
    }
}

/// A first level record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRow {
    timestamp: DateTime<Utc>,
    data: DataPoint,
    #[serde(skip_serializing_if = "Option::is_none")]
    l0_id: Option<RecordId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    patient: Option<PatientBinding>,
    lifecycle: Lifecycle,
}

impl PatientRow {
    #[must_use]
    pub fn new(timestamp: DateTime<Utc>, data: DataPoint) -> Self {
        Self {
            timestamp,
            data,
            l0_id: None,
            patient: None,
            lifecycle: Lifecycle::new(),
        }
    }

    /// Links the row to the L0 record its flow is inherited from.
    #[must_use]
    pub fn with_l0(mut self, l0_id: RecordId) -> Self {
        self.l0_id = Some(l0_id);
        self
    }

    /// Binds the row to a patient, optionally guarded by a password.
    #[must_use]
    pub fn with_patient(mut self, patient_id: u64, password: Option<&str>) -> Self {
        self.patient = Some(PatientBinding::new(patient_id, password));
        self
    }

    #[must_use]
    pub const fn l0_id(&self) -> Option<RecordId> {
        self.l0_id
    }

    /// Returns the patient id if one is bound and `password` matches the
    /// original setup.
    #[must_use]
    pub fn patient_id(&self, password: Option<&str>) -> Option<u64> {
        self.patient.as_ref().and_then(|binding| binding.unlock(password))
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

impl_row!(PatientRow, crate::row::RowLevel::L1);
