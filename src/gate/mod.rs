//! Gate logic: the decision between processed and automated channels.
//!
//! Every gate label has one [`GateLogic`]. Each cycle both channels vote per
//! label through a [`GateSignal`]: `Some(true)` asks to open, `Some(false)`
//! asks to keep closed, `None` abstains. The logic chooses which channel, if
//! any, passes its data through the gate.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::data::DataPoint;
use crate::error::ValidationError;
use crate::row::{Channel, GateRow};

mod area;

pub use area::{AreaOfGates, GateAction};

/// The nine supported gate logics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GateLogic {
    /// `P OR A (P)`: either channel opens; processed data wins a tie.
    OrPreferProcessed,
    /// `P OR A (A)`: either channel opens; automated data wins a tie.
    OrPreferAutomated,
    /// `P AND A (P)`: both must open; processed data passes.
    AndPassProcessed,
    /// `P AND A (A)`: both must open; automated data passes.
    AndPassAutomated,
    /// `P XOR A`: exactly one channel opens.
    Xor,
    /// `P > A`: processed decides; automated only counts if processed abstains.
    ProcessedOverAutomated,
    /// `P < A`: automated decides; processed only counts if automated abstains.
    AutomatedOverProcessed,
    /// `P ONLY`
    ProcessedOnly,
    /// `ONLY A`
    AutomatedOnly,
}

impl GateLogic {
    pub const ALL: [Self; 9] = [
        Self::OrPreferProcessed,
        Self::OrPreferAutomated,
        Self::AndPassProcessed,
        Self::AndPassAutomated,
        Self::Xor,
        Self::ProcessedOverAutomated,
        Self::AutomatedOverProcessed,
        Self::ProcessedOnly,
        Self::AutomatedOnly,
    ];

    /// The textual identifier used in gate configuration.
    #[must_use]
    pub const fn identifier(self) -> &'static str {
        match self {
            Self::OrPreferProcessed => "P OR A (P)",
            Self::OrPreferAutomated => "P OR A (A)",
            Self::AndPassProcessed => "P AND A (P)",
            Self::AndPassAutomated => "P AND A (A)",
            Self::Xor => "P XOR A",
            Self::ProcessedOverAutomated => "P > A",
            Self::AutomatedOverProcessed => "P < A",
            Self::ProcessedOnly => "P ONLY",
            Self::AutomatedOnly => "ONLY A",
        }
    }

    /// Parses an identifier configured for `label`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::UnknownGateLogic` for an unknown identifier.
    pub fn parse(label: &str, identifier: &str) -> Result<Self, ValidationError> {
        Self::ALL
            .into_iter()
            .find(|logic| logic.identifier() == identifier)
            .ok_or_else(|| ValidationError::UnknownGateLogic {
                label: label.to_string(),
                logic: identifier.to_string(),
            })
    }

    /// The channel whose data passes, or `None` if the gate stays closed.
    #[must_use]
    pub fn select(self, processed: Option<bool>, automated: Option<bool>) -> Option<Channel> {
        let p = processed == Some(true);
        let a = automated == Some(true);
        match self {
            Self::OrPreferProcessed => match (p, a) {
                (true, _) => Some(Channel::Processed),
                (false, true) => Some(Channel::Automated),
                (false, false) => None,
            },
            Self::OrPreferAutomated => match (p, a) {
                (_, true) => Some(Channel::Automated),
                (true, false) => Some(Channel::Processed),
                (false, false) => None,
            },
            Self::AndPassProcessed => (p && a).then_some(Channel::Processed),
            Self::AndPassAutomated => (p && a).then_some(Channel::Automated),
            Self::Xor => match (p, a) {
                (true, false) => Some(Channel::Processed),
                (false, true) => Some(Channel::Automated),
                _ => None,
            },
            Self::ProcessedOverAutomated => match processed {
                Some(true) => Some(Channel::Processed),
                Some(false) => None,
                None => a.then_some(Channel::Automated),
            },
            Self::AutomatedOverProcessed => match automated {
                Some(true) => Some(Channel::Automated),
                Some(false) => None,
                None => p.then_some(Channel::Processed),
            },
            Self::ProcessedOnly => p.then_some(Channel::Processed),
            Self::AutomatedOnly => a.then_some(Channel::Automated),
        }
    }

    /// Applies the logic to both signals and returns the passed data.
    ///
    /// An open gate whose chosen channel carries no data yields `None`.
    #[must_use]
    pub fn evaluate<'a, T>(
        self,
        processed: &'a GateSignal<T>,
        automated: &'a GateSignal<T>,
    ) -> Option<&'a T> {
        match self.select(processed.open, automated.open)? {
            Channel::Processed => processed.data.as_ref(),
            Channel::Automated => automated.data.as_ref(),
        }
    }
}

impl fmt::Display for GateLogic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

impl FromStr for GateLogic {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse("", s)
    }
}

/// One channel's vote for one gate label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateSignal<T> {
    pub open: Option<bool>,
    pub data: Option<T>,
}

impl<T> GateSignal<T> {
    #[must_use]
    pub const fn open(data: T) -> Self {
        Self {
            open: Some(true),
            data: Some(data),
        }
    }

    #[must_use]
    pub const fn closed() -> Self {
        Self {
            open: Some(false),
            data: None,
        }
    }

    #[must_use]
    pub const fn abstain() -> Self {
        Self { open: None, data: None }
    }
}

impl<T> Default for GateSignal<T> {
    fn default() -> Self {
        Self::abstain()
    }
}

/// A gate that opened during one evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct GateOpening {
    pub label: String,
    pub logic: GateLogic,
    pub channel: Channel,
    /// Data carried by the chosen channel, if any.
    pub data: Option<DataPoint>,
    /// Pending level-2 row recording both channels.
    pub row: GateRow,
}

/// Label to logic map for one area of gates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GateTable {
    gates: BTreeMap<String, GateLogic>,
}

impl GateTable {
    /// Builds a table from `(label, identifier)` pairs.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::UnknownGateLogic` naming the first bad pair.
    pub fn from_identifiers<I, L, S>(pairs: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = (L, S)>,
        L: Into<String>,
        S: AsRef<str>,
    {
        let mut gates = BTreeMap::new();
        for (label, identifier) in pairs {
            let label = label.into();
            let logic = GateLogic::parse(&label, identifier.as_ref())?;
            gates.insert(label, logic);
        }
        Ok(Self { gates })
    }

    #[must_use]
    pub fn with_gate(mut self, label: impl Into<String>, logic: GateLogic) -> Self {
        self.gates.insert(label.into(), logic);
        self
    }

    #[must_use]
    pub fn logic(&self, label: &str) -> Option<GateLogic> {
        self.gates.get(label).copied()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.gates.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.gates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    /// Evaluates every gate with the current time.
    #[must_use]
    pub fn evaluate(
        &self,
        processed: &BTreeMap<String, GateSignal<DataPoint>>,
        automated: &BTreeMap<String, GateSignal<DataPoint>>,
    ) -> Vec<GateOpening> {
        self.evaluate_at(Utc::now(), processed, automated)
    }

    /// Evaluates every gate, returning the open ones in label order.
    ///
    /// Labels missing from a channel's map count as abstaining. Labels that
    /// are not in the table are ignored.
    #[must_use]
    pub fn evaluate_at(
        &self,
        timestamp: DateTime<Utc>,
        processed: &BTreeMap<String, GateSignal<DataPoint>>,
        automated: &BTreeMap<String, GateSignal<DataPoint>>,
    ) -> Vec<GateOpening> {
        let abstain = GateSignal::abstain();
        self.gates
            .iter()
            .filter_map(|(label, &logic)| {
                let p = processed.get(label).unwrap_or(&abstain);
                let a = automated.get(label).unwrap_or(&abstain);
                let channel = logic.select(p.open, a.open)?;
                let data = match channel {
                    Channel::Processed => p.data.clone(),
                    Channel::Automated => a.data.clone(),
                };
                tracing::debug!(gate = %label, %logic, %channel, "gate opened");
                Some(GateOpening {
                    label: label.clone(),
                    logic,
                    channel,
                    data,
                    row: GateRow::new(timestamp, p.data.clone(), a.data.clone()),
                })
            })
            .collect()
    }
}
