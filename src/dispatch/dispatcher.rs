//! Package fan-out.
//!
//! The dispatcher owns one sink per flow and delivers every non-empty slice
//! of a package to its sink. Deliveries are independent: the outcome of one
//! flow never changes what the other two receive.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use crate::error::DispatchError;
use crate::package::{PackageId, RoutingPackage};

use super::channels::FlowSenders;
use super::sink::{FlowSink, NullSink};
use super::Flow;

/// What happened to one slice of a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotOutcome {
    /// The slice was empty; the sink was not called.
    Empty,
    Delivered,
    Failed(DispatchError),
}

impl SlotOutcome {
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Per-flow outcome of one `dispatch` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub package_id: PackageId,
    pub flow: SlotOutcome,
    pub data: SlotOutcome,
    pub ui: SlotOutcome,
}

impl DispatchReport {
    #[must_use]
    pub const fn outcome(&self, flow: Flow) -> &SlotOutcome {
        match flow {
            Flow::Main => &self.flow,
            Flow::Data => &self.data,
            Flow::Ui => &self.ui,
        }
    }

    /// True when no sink failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures().is_empty()
    }

    #[must_use]
    pub fn failures(&self) -> Vec<&DispatchError> {
        Flow::ALL
            .iter()
            .filter_map(|f| match self.outcome(*f) {
                SlotOutcome::Failed(err) => Some(err),
                SlotOutcome::Empty | SlotOutcome::Delivered => None,
            })
            .collect()
    }
}

/// Snapshot of dispatcher counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchStats {
    delivered: [u64; 3],
    failed: [u64; 3],
}

impl DispatchStats {
    #[must_use]
    pub const fn delivered(&self, flow: Flow) -> u64 {
        self.delivered[flow_index(flow)]
    }

    #[must_use]
    pub const fn failed(&self, flow: Flow) -> u64 {
        self.failed[flow_index(flow)]
    }
}

const fn flow_index(flow: Flow) -> usize {
    match flow {
        Flow::Main => 0,
        Flow::Data => 1,
        Flow::Ui => 2,
    }
}

#[derive(Debug, Default)]
struct FlowCounters {
    delivered: AtomicU64,
    failed: AtomicU64,
}

/// Fans routing packages out to the main, data and UI sinks.
///
/// Flows without a configured sink use [`NullSink`].
pub struct Dispatcher<F, D = F, U = F> {
    flow: Box<dyn FlowSink<F>>,
    data: Box<dyn FlowSink<D>>,
    ui: Box<dyn FlowSink<U>>,
    counters: [FlowCounters; 3],
}

impl<F, D, U> fmt::Debug for Dispatcher<F, D, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher").field("stats", &self.stats()).finish_non_exhaustive()
    }
}

impl<F, D, U> Default for Dispatcher<F, D, U> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F, D, U> Dispatcher<F, D, U> {
    /// A dispatcher whose three flows all go nowhere.
    #[must_use]
    pub fn new() -> Self {
        Self {
            flow: Box::new(NullSink),
            data: Box::new(NullSink),
            ui: Box::new(NullSink),
            counters: Default::default(),
        }
    }

    #[must_use]
    pub fn with_flow_sink(mut self, sink: impl FlowSink<F> + 'static) -> Self {
        self.flow = Box::new(sink);
        self
    }

    #[must_use]
    pub fn with_data_sink(mut self, sink: impl FlowSink<D> + 'static) -> Self {
        self.data = Box::new(sink);
        self
    }

    #[must_use]
    pub fn with_ui_sink(mut self, sink: impl FlowSink<U> + 'static) -> Self {
        self.ui = Box::new(sink);
        self
    }

    /// Delivers each non-empty slice to its sink, one flow after another.
    pub fn dispatch(&self, package: RoutingPackage<F, D, U>) -> DispatchReport {
        let package_id = package.id();
        let (flow, data, ui) = package.into_parts();
        DispatchReport {
            package_id,
            flow: self.deliver(package_id, Flow::Main, self.flow.as_ref(), flow),
            data: self.deliver(package_id, Flow::Data, self.data.as_ref(), data),
            ui: self.deliver(package_id, Flow::Ui, self.ui.as_ref(), ui),
        }
    }

    #[must_use]
    pub fn stats(&self) -> DispatchStats {
        let mut stats = DispatchStats::default();
        for (idx, c) in self.counters.iter().enumerate() {
            stats.delivered[idx] = c.delivered.load(Ordering::Relaxed);
            stats.failed[idx] = c.failed.load(Ordering::Relaxed);
        }
        stats
    }

    fn deliver<T>(
        &self,
        package_id: PackageId,
        flow: Flow,
        sink: &dyn FlowSink<T>,
        payload: Option<T>,
    ) -> SlotOutcome {
        let Some(payload) = payload else {
            return SlotOutcome::Empty;
        };
        let counters = &self.counters[flow_index(flow)];
        match sink.send(payload) {
            Ok(()) => {
                counters.delivered.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(package = %package_id, %flow, "slice delivered");
                SlotOutcome::Delivered
            }
            Err(err) => {
                counters.failed.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(package = %package_id, %flow, error = %err, "slice delivery failed");
                SlotOutcome::Failed(err)
            }
        }
    }
}

impl<F: Send, D: Send, U: Send> Dispatcher<F, D, U> {
    /// Delivers the three slices on separate scoped threads.
    ///
    /// The report is identical in shape to [`Dispatcher::dispatch`]. A sink
    /// that panics is reported as `Failed(Rejected)` for its own flow and
    /// never unwinds into the caller.
    pub fn dispatch_concurrent(&self, package: RoutingPackage<F, D, U>) -> DispatchReport {
        let package_id = package.id();
        let (flow, data, ui) = package.into_parts();
        thread::scope(|s| {
            let flow_handle =
                s.spawn(|| self.deliver(package_id, Flow::Main, self.flow.as_ref(), flow));
            let data_handle =
                s.spawn(|| self.deliver(package_id, Flow::Data, self.data.as_ref(), data));
            let ui_handle = s.spawn(|| self.deliver(package_id, Flow::Ui, self.ui.as_ref(), ui));
            DispatchReport {
                package_id,
                flow: join_slot(flow_handle, Flow::Main),
                data: join_slot(data_handle, Flow::Data),
                ui: join_slot(ui_handle, Flow::Ui),
            }
        })
    }
}

fn join_slot(handle: thread::ScopedJoinHandle<'_, SlotOutcome>, flow: Flow) -> SlotOutcome {
    handle.join().unwrap_or_else(|_| {
        tracing::warn!(%flow, "sink panicked");
        SlotOutcome::Failed(DispatchError::Rejected {
            flow,
            reason: "sink panicked".to_string(),
        })
    })
}

impl<F, D, U> Dispatcher<F, D, U>
where
    F: Send + 'static,
    D: Send + 'static,
    U: Send + 'static,
{
    /// A dispatcher feeding the three bounded flow channels.
    #[must_use]
    pub fn from_senders(senders: FlowSenders<F, D, U>) -> Self {
        Self::new()
            .with_flow_sink(senders.flow)
            .with_data_sink(senders.data)
            .with_ui_sink(senders.ui)
    }
}
