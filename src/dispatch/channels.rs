use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};
use serde::{Deserialize, Serialize};

use crate::error::{DispatchError, MgpError, MgpResult};

use super::sink::ChannelSink;
use super::Flow;

#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowChannelsConfig {
    /// Max queued payloads for the main flow.
    pub flow_capacity: usize,
    /// Max queued payloads for the data flow.
    pub data_capacity: usize,
    /// Max queued payloads for the UI flow.
    pub ui_capacity: usize,
}

impl Default for FlowChannelsConfig {
    fn default() -> Self {
        Self {
            flow_capacity: 1024,
            data_capacity: 1024,
            ui_capacity: 1024,
        }
    }
}

/// Producer halves of the three flow channels.
#[derive(Debug, Clone)]
pub struct FlowSenders<F, D = F, U = F> {
    pub flow: ChannelSink<F>,
    pub data: ChannelSink<D>,
    pub ui: ChannelSink<U>,
}

/// Consumer halves of the three flow channels.
///
/// Each receiver can be moved to its own consumer thread.
#[derive(Debug)]
pub struct FlowReceivers<F, D = F, U = F> {
    pub flow: FlowReceiver<F>,
    pub data: FlowReceiver<D>,
    pub ui: FlowReceiver<U>,
}

/// Receiving end of one flow.
#[derive(Debug, Clone)]
pub struct FlowReceiver<T> {
    flow: Flow,
    rx: Receiver<T>,
}

impl<T> FlowReceiver<T> {
    #[must_use]
    pub const fn flow(&self) -> Flow {
        self.flow
    }

    /// Receive the next payload (blocking).
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::Disconnected` once every sender is dropped
    /// and the queue is empty.
    pub fn recv(&self) -> MgpResult<T> {
        self.rx
            .recv()
            .map_err(|_| MgpError::Dispatch(DispatchError::Disconnected { flow: self.flow }))
    }

    /// Receive the next payload with a timeout; `Ok(None)` on timeout.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::Disconnected` once every sender is dropped
    /// and the queue is empty.
    pub fn recv_timeout(&self, timeout: Duration) -> MgpResult<Option<T>> {
        match self.rx.recv_timeout(timeout) {
            Ok(payload) => Ok(Some(payload)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => {
                Err(MgpError::Dispatch(DispatchError::Disconnected { flow: self.flow }))
            }
        }
    }

    /// Drains whatever is queued right now without blocking.
    #[must_use]
    pub fn drain(&self) -> Vec<T> {
        self.rx.try_iter().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

/// Creates one bounded channel per flow.
///
/// Capacities below 1 are raised to 1.
#[must_use]
pub fn flow_channels<F, D, U>(
    cfg: &FlowChannelsConfig,
) -> (FlowSenders<F, D, U>, FlowReceivers<F, D, U>) {
    let (flow_tx, flow_rx) = bounded::<F>(cfg.flow_capacity.max(1));
    let (data_tx, data_rx) = bounded::<D>(cfg.data_capacity.max(1));
    let (ui_tx, ui_rx) = bounded::<U>(cfg.ui_capacity.max(1));

    let senders = FlowSenders {
        flow: ChannelSink::new(Flow::Main, flow_tx),
        data: ChannelSink::new(Flow::Data, data_tx),
        ui: ChannelSink::new(Flow::Ui, ui_tx),
    };
    let receivers = FlowReceivers {
        flow: FlowReceiver { flow: Flow::Main, rx: flow_rx },
        data: FlowReceiver { flow: Flow::Data, rx: data_rx },
        ui: FlowReceiver { flow: Flow::Ui, rx: ui_rx },
    };
    (senders, receivers)
}
