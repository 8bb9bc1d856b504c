//! Cart notifications.
//!
//! The cart store owns one [`EventChannel`] per notification type. Delivery
//! is synchronous: `emit` calls every listener subscribed at that moment, in
//! subscription order, before returning. There is no queue and no replay.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};

use chrono::{DateTime, Utc};

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;
type Listeners<T> = RwLock<Vec<(u64, Listener<T>)>>;

/// A typed, synchronous fan-out channel.
pub struct EventChannel<T> {
    listeners: Arc<Listeners<T>>,
    next_id: AtomicU64,
}

impl<T> Default for EventChannel<T> {
    fn default() -> Self {
        Self {
            listeners: Arc::new(RwLock::new(Vec::new())),
            next_id: AtomicU64::new(0),
        }
    }
}

impl<T> std::fmt::Debug for EventChannel<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventChannel")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl<T> EventChannel<T> {
    /// Create a channel with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener`. It stays registered until the returned
    /// [`Subscription`] is explicitly unsubscribed.
    pub fn subscribe<F>(&self, listener: F) -> Subscription<T>
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(listener)));

        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    /// Deliver `event` to every current listener.
    pub fn emit(&self, event: &T) {
        // Snapshot first so listeners may subscribe or unsubscribe re-entrantly.
        let listeners: Vec<Listener<T>> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in listeners {
            listener(event);
        }
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Handle returned by [`EventChannel::subscribe`].
///
/// Dropping it leaves the listener registered.
#[must_use = "keep the subscription to be able to unsubscribe"]
pub struct Subscription<T> {
    id: u64,
    listeners: Weak<Listeners<T>>,
}

impl<T> std::fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

impl<T> Subscription<T> {
    /// Detach the listener. A no-op if the channel is gone.
    pub fn unsubscribe(self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .retain(|(id, _)| *id != self.id);
        }
    }
}

/// A product was added to the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemAdded {
    pub title: String,
    pub thumbnail: Option<String>,
}

/// A quantity change was rejected or reduced by the stock ceiling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockError {
    pub title: String,
    /// Human-readable reason (e.g., "Maximum stock: 5").
    pub message: String,
    /// The finite ceiling that applied.
    pub ceiling: u32,
    /// When the stock snapshot behind the decision was taken.
    pub snapshot_taken_at: DateTime<Utc>,
}

/// Notification channels owned by a cart store.
#[derive(Debug, Default)]
pub struct CartEvents {
    /// `cart-item-added`
    pub item_added: EventChannel<ItemAdded>,
    /// `cart-stock-error`
    pub stock_error: EventChannel<StockError>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn test_emit_reaches_all_listeners_in_order() {
        let channel: EventChannel<u32> = EventChannel::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let a = Arc::clone(&seen);
        let _first = channel.subscribe(move |n| a.lock().unwrap().push(("a", *n)));
        let b = Arc::clone(&seen);
        let _second = channel.subscribe(move |n| b.lock().unwrap().push(("b", *n)));

        channel.emit(&7);
        assert_eq!(*seen.lock().unwrap(), vec![("a", 7), ("b", 7)]);
    }

    #[test]
    fn test_unsubscribe_detaches() {
        let channel: EventChannel<u32> = EventChannel::new();
        let count = Arc::new(AtomicU64::new(0));

        let c = Arc::clone(&count);
        let subscription = channel.subscribe(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        channel.emit(&1);
        subscription.unsubscribe();
        channel.emit(&2);

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(channel.listener_count(), 0);
    }

    #[test]
    fn test_dropping_subscription_keeps_listener() {
        let channel: EventChannel<u32> = EventChannel::new();
        drop(channel.subscribe(|_| {}));
        assert_eq!(channel.listener_count(), 1);
    }

    #[test]
    fn test_no_replay_for_late_subscribers() {
        let channel: EventChannel<u32> = EventChannel::new();
        channel.emit(&1);

        let count = Arc::new(AtomicU64::new(0));
        let c = Arc::clone(&count);
        let _sub = channel.subscribe(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unsubscribe_after_channel_dropped() {
        let channel: EventChannel<u32> = EventChannel::new();
        let subscription = channel.subscribe(|_| {});
        drop(channel);
        subscription.unsubscribe();
    }
}
