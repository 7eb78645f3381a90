//! # MGP - Medical Gateway Platform core
//!
//! MGP moves observations from medical equipment through a pipeline of
//! areas. Every observation is captured as a typed row, decided exactly once
//! (filtered or persisted), and routed to three downstream flows.
//!
//! ## Core Concepts
//!
//! - **DataPoint**: A labeled value with a unit
//! - **Row**: An observation at one of four levels (event, patient, gate, response)
//!   with a single-fire lifecycle
//! - **RoutingPackage**: Three independent slices for the main, data and UI flows
//! - **Dispatcher**: Fans packages out to per-flow sinks that fail independently
//!
//! ## Usage
//!
//! ```rust
//! use mgp::{DataPoint, EventRow, Row, RoutingPackage, Value};
//!
//! let mut row = EventRow::now(DataPoint::new("temperature", 36.6, "C"), 17, "sensor_reading")?;
//! assert_eq!(row.id(), -1);
//!
//! row.consume(4031)?;
//! assert_eq!(row.id(), 4031);
//! assert!(row.consume(4032).is_err());
//!
//! let package: RoutingPackage<DataPoint, DataPoint, String> = RoutingPackage::builder()
//!     .flow(row.data().clone())
//!     .ui(format!("{} = {}", row.label(), row.value()))
//!     .build();
//! assert_eq!(package.flow().map(DataPoint::value), Some(&Value::Float(36.6)));
//! assert!(package.data().is_none());
//! # Ok::<(), mgp::MgpError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Core types
pub mod data;
pub mod error;
pub mod package;
pub mod row;
pub mod value;

// Areas and plumbing
pub mod controller;
pub mod dispatch;
pub mod gate;
pub mod storage;

// Re-export primary types at crate root for convenience
pub use controller::{Controller, Filter, Handler};
pub use data::DataPoint;
pub use dispatch::{
    flow_channels, ChannelSink, DispatchReport, Dispatcher, Flow, FlowChannelsConfig, FlowSink,
    NullSink, SlotOutcome,
};
pub use error::{DispatchError, MgpError, MgpResult, RegistryError, StateError, ValidationError};
pub use gate::{AreaOfGates, GateAction, GateLogic, GateOpening, GateSignal, GateTable};
pub use package::{PackageId, RoutingPackage, RoutingPackageBuilder};
pub use row::{
    Channel, EventRow, Finalization, GateRow, Lifecycle, PatientRow, RecordId, ResponseRow, Row,
    RowLevel, RowState,
};
pub use storage::{InMemoryRecordStore, RecordStore, StorageError};
pub use value::Value;
