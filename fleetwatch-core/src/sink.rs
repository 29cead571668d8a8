//! Hand-off of monitor events to external collaborators.
//!
//! Publication never blocks the sample-processing path: sinks queue or drop
//! events, and persistence or notification happens on the consumer side.

use std::sync::Arc;

use log::warn;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use crate::MonitorEvent;

/// Receive events produced by the monitors.
///
/// Implementations must return promptly and must be thread-safe, since
/// different entities may be processed on different threads.
pub trait EventSink: Send + Sync {
    /// Hand `event` to the collaborator.
    fn publish(&self, event: MonitorEvent);
}

impl<T: EventSink + ?Sized> EventSink for Arc<T> {
    fn publish(&self, event: MonitorEvent) {
        (**self).publish(event);
    }
}

/// Sink forwarding events into an unbounded `tokio` channel.
///
/// Sending never awaits the consumer. When the receiver has been dropped the
/// event is discarded with a warning.
///
/// # Examples
/// ```
/// use chrono::Utc;
/// use uuid::Uuid;
/// use fleetwatch_core::{ChannelSink, EventSink, MonitorEvent};
///
/// let (sink, mut rx) = ChannelSink::new();
/// sink.publish(MonitorEvent::CorridorStateChanged {
///     trip_id: Uuid::nil(),
///     is_off_route: true,
///     timestamp: Utc::now(),
/// });
/// assert!(rx.try_recv().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: UnboundedSender<MonitorEvent>,
}

impl ChannelSink {
    /// Create a sink and the receiver its events are delivered to.
    #[must_use]
    pub fn new() -> (Self, UnboundedReceiver<MonitorEvent>) {
        let (sender, receiver) = unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl EventSink for ChannelSink {
    fn publish(&self, event: MonitorEvent) {
        if let Err(err) = self.sender.send(event) {
            warn!(
                "event receiver closed; dropping event at {}",
                err.0.timestamp()
            );
        }
    }
}

/// Sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn publish(&self, _event: MonitorEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rstest::rstest;
    use uuid::Uuid;

    fn state_change() -> MonitorEvent {
        MonitorEvent::CorridorStateChanged {
            trip_id: Uuid::nil(),
            is_off_route: false,
            timestamp: Utc::now(),
        }
    }

    #[rstest]
    fn channel_sink_delivers_in_order() {
        let (sink, mut rx) = ChannelSink::new();
        let first = state_change();
        let second = state_change();
        sink.publish(first.clone());
        sink.publish(second.clone());
        assert_eq!(rx.try_recv().ok(), Some(first));
        assert_eq!(rx.try_recv().ok(), Some(second));
    }

    #[rstest]
    fn closed_receiver_is_tolerated() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        sink.publish(state_change());
    }

    #[rstest]
    fn shared_sinks_forward() {
        let (sink, mut rx) = ChannelSink::new();
        let shared: Arc<dyn EventSink> = Arc::new(sink);
        shared.publish(state_change());
        assert!(rx.try_recv().is_ok());
    }
}
