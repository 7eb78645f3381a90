//! Area of gates: one decision cycle from channel votes to actuators.
//!
//! Every gate that opens runs the output handler registered under its label,
//! then its level-2 row is published to the data and UI flows.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::controller::Controller;
use crate::data::DataPoint;
use crate::dispatch::{DispatchReport, Dispatcher};
use crate::error::{MgpResult, RegistryError};
use crate::package::RoutingPackage;
use crate::row::{Channel, GateRow};

use super::{GateOpening, GateSignal, GateTable};

/// What one open gate produced during a cycle.
#[derive(Debug)]
pub struct GateAction {
    pub label: String,
    pub channel: Channel,
    /// Outcome of the output handler chain.
    pub output: MgpResult<DispatchReport>,
    /// Delivery of the gate row to the data and UI flows.
    pub record: DispatchReport,
}

/// Gate table bound to its output handlers and the gate-row flows.
///
/// Output handlers are keyed by gate label and receive the [`GateOpening`].
/// Only the data and UI sinks of the record dispatcher are used.
#[derive(Debug)]
pub struct AreaOfGates<F, D = F, U = F> {
    gates: GateTable,
    output: Controller<GateOpening, F, D, U>,
    records: Dispatcher<GateRow>,
}

impl<F, D, U> AreaOfGates<F, D, U> {
    /// Binds a gate table to its output controller and record dispatcher.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::UnknownHandler` naming the first gate label
    /// that has no output handler.
    pub fn new(
        gates: GateTable,
        output: Controller<GateOpening, F, D, U>,
        records: Dispatcher<GateRow>,
    ) -> Result<Self, RegistryError> {
        if let Some(label) = gates.labels().find(|label| !output.is_registered(label)) {
            return Err(RegistryError::UnknownHandler {
                name: label.to_string(),
            });
        }
        Ok(Self {
            gates,
            output,
            records,
        })
    }

    #[must_use]
    pub const fn gates(&self) -> &GateTable {
        &self.gates
    }

    #[must_use]
    pub const fn output(&self) -> &Controller<GateOpening, F, D, U> {
        &self.output
    }

    #[must_use]
    pub const fn records(&self) -> &Dispatcher<GateRow> {
        &self.records
    }

    /// Runs one cycle stamped with the current time.
    pub fn cycle(
        &self,
        processed: &BTreeMap<String, GateSignal<DataPoint>>,
        automated: &BTreeMap<String, GateSignal<DataPoint>>,
    ) -> Vec<GateAction> {
        self.cycle_at(Utc::now(), processed, automated)
    }

    /// Runs one cycle: evaluates every gate, acts on the open ones in label
    /// order, and publishes each open gate's row.
    ///
    /// A failing output handler does not stop the cycle; its error is kept
    /// in that gate's [`GateAction`] and the row is still published.
    pub fn cycle_at(
        &self,
        timestamp: DateTime<Utc>,
        processed: &BTreeMap<String, GateSignal<DataPoint>>,
        automated: &BTreeMap<String, GateSignal<DataPoint>>,
    ) -> Vec<GateAction> {
        self.gates
            .evaluate_at(timestamp, processed, automated)
            .into_iter()
            .map(|opening| {
                let label = opening.label.clone();
                let channel = opening.channel;
                let row = opening.row.clone();

                let output = self.output.read(&label, opening);
                if let Err(err) = &output {
                    tracing::warn!(gate = %label, error = %err, "output handler failed");
                }
                let record = self
                    .records
                    .dispatch(RoutingPackage::new(None, Some(row.clone()), Some(row)));

                GateAction {
                    label,
                    channel,
                    output,
                    record,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::Handler;
    use crate::dispatch::{flow_channels, FlowChannelsConfig, SlotOutcome};
    use crate::error::MgpError;
    use crate::gate::GateLogic;

    fn actuator() -> Handler<GateOpening, String> {
        Handler::new("actuator", |opening: GateOpening| {
            let command = format!("{} via {}", opening.label, opening.channel);
            Ok(RoutingPackage::new(Some(command), None, None))
        })
    }

    #[test]
    fn test_new_requires_handler_for_every_gate() {
        let gates = GateTable::default()
            .with_gate("valve", GateLogic::ProcessedOnly)
            .with_gate("pump", GateLogic::Xor);
        let mut output: Controller<GateOpening, String> = Controller::default();
        output.register("valve", actuator()).unwrap();

        let err = AreaOfGates::new(gates, output, Dispatcher::new()).unwrap_err();
        assert_eq!(err, RegistryError::UnknownHandler { name: "pump".to_string() });
    }

    #[test]
    fn test_cycle_acts_and_publishes_rows() {
        let gates = GateTable::default()
            .with_gate("valve", GateLogic::ProcessedOnly)
            .with_gate("pump", GateLogic::AutomatedOnly);
        let cfg = FlowChannelsConfig::default();
        let (out_tx, out_rx) = flow_channels::<String, String, String>(&cfg);
        let mut output = Controller::new(Dispatcher::from_senders(out_tx));
        output.register("valve", actuator()).unwrap();
        output.register("pump", actuator()).unwrap();
        let (row_tx, row_rx) = flow_channels::<GateRow, GateRow, GateRow>(&cfg);
        let area = AreaOfGates::new(gates, output, Dispatcher::from_senders(row_tx)).unwrap();

        let mut processed = BTreeMap::new();
        processed.insert("valve".to_string(), GateSignal::open(DataPoint::new("valve", 1, "")));
        let actions = area.cycle(&processed, &BTreeMap::new());

        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].label, "valve");
        assert!(actions[0].output.as_ref().unwrap().is_success());
        assert_eq!(actions[0].record.flow, SlotOutcome::Empty);
        assert_eq!(actions[0].record.data, SlotOutcome::Delivered);

        assert_eq!(out_rx.flow.drain(), vec!["valve via processed".to_string()]);
        assert!(row_rx.flow.is_empty());
        assert_eq!(row_rx.data.drain().len(), 1);
        assert_eq!(row_rx.ui.drain().len(), 1);
    }

    #[test]
    fn test_handler_failure_keeps_cycle_going() {
        let gates = GateTable::default()
            .with_gate("alarm", GateLogic::OrPreferProcessed)
            .with_gate("valve", GateLogic::OrPreferProcessed);
        let mut output: Controller<GateOpening, String> = Controller::default();
        let broken = Handler::new("broken", |_: GateOpening| {
            Err(MgpError::internal("actuator offline"))
        });
        output.register("alarm", broken).unwrap();
        output.register("valve", actuator()).unwrap();
        let area = AreaOfGates::new(gates, output, Dispatcher::new()).unwrap();

        let mut processed = BTreeMap::new();
        processed.insert("alarm".to_string(), GateSignal::open(DataPoint::event("alarm", true)));
        processed.insert("valve".to_string(), GateSignal::open(DataPoint::event("valve", 1)));
        let actions = area.cycle(&processed, &BTreeMap::new());

        assert_eq!(actions.len(), 2);
        assert!(actions[0].output.as_ref().unwrap_err().is_internal());
        assert_eq!(actions[0].record.data, SlotOutcome::Delivered);
        assert!(actions[1].output.is_ok());
    }
}
