use crossbeam_channel::{Sender, TrySendError};

use crate::error::DispatchError;

use super::Flow;

/// A downstream consumer of one flow.
///
/// Implementations must not block the controller: a slow consumer should
/// report `QueueFull` rather than stall the cycle.
pub trait FlowSink<T>: Send + Sync {
    /// Hands one payload to the consumer.
    ///
    /// # Errors
    ///
    /// Returns a `DispatchError` when the consumer cannot take the payload.
    fn send(&self, payload: T) -> Result<(), DispatchError>;
}

/// Any `Fn(T) -> Result<(), DispatchError>` is a sink.
impl<T, Func> FlowSink<T> for Func
where
    Func: Fn(T) -> Result<(), DispatchError> + Send + Sync,
{
    fn send(&self, payload: T) -> Result<(), DispatchError> {
        self(payload)
    }
}

/// Endpoint-less sink for a flow that is not running. Accepts and drops.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl<T> FlowSink<T> for NullSink {
    fn send(&self, _payload: T) -> Result<(), DispatchError> {
        Ok(())
    }
}

/// Sink backed by a bounded crossbeam channel.
///
/// Sending never blocks; a full channel is reported as `QueueFull`.
#[derive(Debug, Clone)]
pub struct ChannelSink<T> {
    flow: Flow,
    tx: Sender<T>,
}

impl<T> ChannelSink<T> {
    #[must_use]
    pub const fn new(flow: Flow, tx: Sender<T>) -> Self {
        Self { flow, tx }
    }

    #[must_use]
    pub const fn flow(&self) -> Flow {
        self.flow
    }
}

impl<T: Send> FlowSink<T> for ChannelSink<T> {
    fn send(&self, payload: T) -> Result<(), DispatchError> {
        match self.tx.try_send(payload) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(DispatchError::QueueFull {
                flow: self.flow,
                capacity: self.tx.capacity().unwrap_or(0),
            }),
            Err(TrySendError::Disconnected(_)) => {
                Err(DispatchError::Disconnected { flow: self.flow })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;

    #[test]
    fn test_null_sink_accepts_everything() {
        let sink = NullSink;
        for i in 0..100 {
            assert!(FlowSink::<i32>::send(&sink, i).is_ok());
        }
    }

    #[test]
    fn test_channel_sink_full_and_disconnected() {
        let (tx, rx) = bounded::<u8>(1);
        let sink = ChannelSink::new(Flow::Data, tx);

        sink.send(1).unwrap();
        assert_eq!(
            sink.send(2).unwrap_err(),
            DispatchError::QueueFull { flow: Flow::Data, capacity: 1 }
        );
        assert_eq!(rx.try_recv().unwrap(), 1);

        drop(rx);
        assert_eq!(sink.send(3).unwrap_err(), DispatchError::Disconnected { flow: Flow::Data });
    }

    #[test]
    fn test_closure_sink() {
        let sink = |v: u8| {
            if v > 10 {
                Err(DispatchError::Rejected {
                    flow: Flow::Ui,
                    reason: "too large".to_string(),
                })
            } else {
                Ok(())
            }
        };
        assert!(sink.send(3).is_ok());
        assert!(sink.send(30).is_err());
    }
}
