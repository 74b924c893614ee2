use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{Sender, channel};
use std::sync::Mutex;

use thiserror::Error;

use crate::bus::{EventBus, Subscription, SubscriptionId};

#[derive(Debug, Error)]
pub enum InMemoryBusError {
    #[error("notification bus lock poisoned")]
    Poisoned,
}

/// Process-local bus backed by one mpsc channel per listener.
///
/// Listeners that dropped their [`Subscription`] are forgotten the next time
/// something is published.
#[derive(Debug)]
pub struct InMemoryEventBus<M> {
    issued: AtomicU64,
    listeners: Mutex<Vec<(SubscriptionId, Sender<M>)>>,
}

impl<M> InMemoryEventBus<M> {
    pub fn new() -> Self {
        Self {
            issued: AtomicU64::new(0),
            listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        match self.listeners.lock() {
            Ok(listeners) => listeners.len(),
            Err(_) => 0,
        }
    }
}

impl<M> Default for InMemoryEventBus<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Clone + Send + 'static> EventBus<M> for InMemoryEventBus<M> {
    type Error = InMemoryBusError;

    fn publish(&self, message: M) -> Result<(), InMemoryBusError> {
        let mut listeners = self.listeners.lock().map_err(|_| InMemoryBusError::Poisoned)?;
        listeners.retain(|(_, inbox)| inbox.send(message.clone()).is_ok());
        Ok(())
    }

    fn subscribe(&self) -> Subscription<M> {
        let id = SubscriptionId(self.issued.fetch_add(1, Ordering::Relaxed) + 1);
        let (inbox, outbox) = channel();
        match self.listeners.lock() {
            Ok(mut listeners) => listeners.push((id, inbox)),
            Err(_) => tracing::warn!(subscription = id.0, "bus lock poisoned; listener not registered"),
        }
        Subscription::new(id, outbox)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let Ok(mut listeners) = self.listeners.lock() else {
            return false;
        };
        match listeners.iter().position(|(registered, _)| *registered == id) {
            Some(index) => {
                listeners.remove(index);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fan_out_reaches_each_listener() {
        let bus = InMemoryEventBus::new();
        let first = bus.subscribe();
        let second = bus.subscribe();

        bus.publish("stock changed").unwrap();

        assert_eq!(first.try_recv().unwrap(), "stock changed");
        assert_eq!(second.try_recv().unwrap(), "stock changed");
    }

    #[test]
    fn unsubscribe_is_one_shot() {
        let bus = InMemoryEventBus::new();
        let gone = bus.subscribe();
        let kept = bus.subscribe();

        assert!(bus.unsubscribe(gone.id()));
        assert!(!bus.unsubscribe(gone.id()));
        bus.publish(7u32).unwrap();

        assert!(gone.try_recv().is_err());
        assert_eq!(kept.drain(), vec![7]);
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[test]
    fn dropped_listener_is_forgotten_after_publish() {
        let bus = InMemoryEventBus::new();
        drop(bus.subscribe());
        assert_eq!(bus.subscriber_count(), 1);

        bus.publish(1u8).unwrap();
        assert_eq!(bus.subscriber_count(), 0);
    }
}
