//! Event Broadcast - fan-out of classified samples to observers
//!
//! Publishing never blocks and never fails the caller: an event with no
//! observers is dropped, and an observer that falls behind skips ahead.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

use crate::models::MonitorEvent;

/// Capability the ingestion path depends on
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: MonitorEvent);
}

/// In-process pub/sub channel backed by `tokio::sync::broadcast`
pub struct Broadcaster {
    sender: broadcast::Sender<MonitorEvent>,
    observers: Arc<AtomicUsize>,
}

impl Broadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            observers: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Register a new observer; it receives events published from now on
    pub fn subscribe(&self) -> Subscription {
        let id = Uuid::new_v4();
        let total = self.observers.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!("Observer connected: {}. Total: {}", id, total);

        Subscription {
            id,
            receiver: self.sender.subscribe(),
            observers: Arc::clone(&self.observers),
        }
    }

    /// Currently connected observers
    pub fn observer_count(&self) -> usize {
        self.observers.load(Ordering::SeqCst)
    }
}

impl EventPublisher for Broadcaster {
    fn publish(&self, event: MonitorEvent) {
        let name = event.name();
        match self.sender.send(event) {
            Ok(delivered) => tracing::trace!("Event '{}' queued for {} observers", name, delivered),
            Err(_) => tracing::trace!("No observers, event '{}' dropped", name),
        }
    }
}

/// One observer's view of the channel
pub struct Subscription {
    id: Uuid,
    receiver: broadcast::Receiver<MonitorEvent>,
    observers: Arc<AtomicUsize>,
}

impl Subscription {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Next event, skipping anything missed while lagging.
    /// `None` once the channel is closed.
    pub async fn next(&mut self) -> Option<MonitorEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Observer {} lagged, skipped {} events", self.id, skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let remaining = self.observers.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
        tracing::info!("Observer disconnected: {}. Total: {}", self.id, remaining);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnomalyAlert, Appliance, ConnectionStatus, SensorReading};

    fn alert() -> MonitorEvent {
        let appliance = Appliance::new("bulb", "Bulb");
        MonitorEvent::AnomalyAlert(AnomalyAlert::new(&appliance, &SensorReading::from_power(500.0)))
    }

    #[test]
    fn test_publish_without_observers() {
        let broadcaster = Broadcaster::new(8);
        broadcaster.publish(alert());
        assert_eq!(broadcaster.observer_count(), 0);
    }

    #[tokio::test]
    async fn test_fan_out_to_all_observers() {
        let broadcaster = Broadcaster::new(8);
        let mut a = broadcaster.subscribe();
        let mut b = broadcaster.subscribe();
        assert_eq!(broadcaster.observer_count(), 2);

        broadcaster.publish(alert());

        assert_eq!(a.next().await.unwrap().name(), "anomaly_alert");
        assert_eq!(b.next().await.unwrap().name(), "anomaly_alert");
    }

    #[tokio::test]
    async fn test_lagging_observer_skips_ahead() {
        let broadcaster = Broadcaster::new(2);
        let mut slow = broadcaster.subscribe();
        let appliance = Appliance::new("bulb", "Bulb");

        for _ in 0..5 {
            broadcaster.publish(alert());
        }
        broadcaster.publish(MonitorEvent::ConnectionStatus(ConnectionStatus::connected(&appliance)));

        // Oldest events were overwritten; the newest still arrives
        let mut last = None;
        for _ in 0..2 {
            last = slow.next().await;
        }
        assert_eq!(last.unwrap().name(), "connection_status");
    }

    #[test]
    fn test_drop_decrements_count() {
        let broadcaster = Broadcaster::new(8);
        let sub = broadcaster.subscribe();
        assert_eq!(broadcaster.observer_count(), 1);

        drop(sub);
        assert_eq!(broadcaster.observer_count(), 0);
    }
}
