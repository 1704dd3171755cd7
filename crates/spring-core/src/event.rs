//! Event bus for spring using tokio::broadcast
//!
//! Carries control-level notifications to observers and content-offset
//! notifications from scroll surfaces to refresh controllers.

use tokio::sync::broadcast;

/// Notifications emitted by a refresh control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    /// A released, saturated pull committed to a refresh
    ValueChanged,
    /// `end_refreshing()` was called
    RefreshEnded,
}

/// Event bus for broadcasting events to any number of observers
///
/// Publishing never fails; events sent with no subscribers are dropped.
pub struct EventBus<E> {
    sender: broadcast::Sender<E>,
}

impl<E: Clone> EventBus<E> {
    /// Create a new event bus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Create with default capacity (256 events)
    pub fn default_capacity() -> Self {
        Self::new(256)
    }

    /// Publish an event to all subscribers
    pub fn publish(&self, event: E) {
        // Ignore send errors (no subscribers)
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<E> {
        self.sender.subscribe()
    }

    /// Get current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl<E: Clone> Default for EventBus<E> {
    fn default() -> Self {
        Self::default_capacity()
    }
}

impl<E> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_bus_publish_subscribe() {
        let bus = EventBus::default_capacity();
        let mut rx = bus.subscribe();

        bus.publish(ControlEvent::ValueChanged);
        bus.publish(ControlEvent::RefreshEnded);

        assert_eq!(rx.recv().await.unwrap(), ControlEvent::ValueChanged);
        assert_eq!(rx.recv().await.unwrap(), ControlEvent::RefreshEnded);
    }

    #[tokio::test]
    async fn test_event_bus_multiple_subscribers() {
        let bus = EventBus::default_capacity();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        assert_eq!(bus.subscriber_count(), 2);

        bus.publish(ControlEvent::ValueChanged);

        assert_eq!(rx1.recv().await.unwrap(), ControlEvent::ValueChanged);
        assert_eq!(rx2.recv().await.unwrap(), ControlEvent::ValueChanged);
    }

    #[test]
    fn test_event_bus_no_subscribers_ok() {
        let bus: EventBus<ControlEvent> = EventBus::default_capacity();
        // Should not panic even with no subscribers
        bus.publish(ControlEvent::RefreshEnded);
    }

    #[test]
    fn test_dropped_receiver_unsubscribes() {
        let bus: EventBus<ControlEvent> = EventBus::default_capacity();
        let rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);
        drop(rx);
        assert_eq!(bus.subscriber_count(), 0);
    }
}
