//! DISPATCH subsystem: hands package slices to the three downstream flows.
//!
//! Each flow has its own sink. Sinks fail independently: a full UI queue
//! never holds back the main flow, and every failure is reported per flow.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Bounded per-flow channels.
pub mod channels;
/// Package fan-out worker.
pub mod dispatcher;
/// Sink trait and built-in sinks.
pub mod sink;

pub use channels::{flow_channels, FlowChannelsConfig, FlowReceiver, FlowReceivers, FlowSenders};
pub use dispatcher::{DispatchReport, DispatchStats, Dispatcher, SlotOutcome};
pub use sink::{ChannelSink, FlowSink, NullSink};

/// One of the three downstream consumers of a routing package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flow {
    /// Process-flow continuation.
    Main,
    /// Persistence/data pipeline.
    Data,
    /// UI notification channel.
    Ui,
}

impl Flow {
    pub const ALL: [Self; 3] = [Self::Main, Self::Data, Self::Ui];
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Main => write!(f, "flow"),
            Self::Data => write!(f, "data"),
            Self::Ui => write!(f, "ui"),
        }
    }
}
