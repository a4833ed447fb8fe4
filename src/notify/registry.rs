//! Subscriber registry backing every change source.

use crate::model::ChangeEvent;
use crate::notify::{ChangeStream, Listener, Subscription};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};

/// Internal subscriber registry state.
struct SubscriberRegistryInner {
    subscribers: Vec<(usize, Listener)>,
    next_id: usize,
}

/// Registry of listeners for one change source.
///
/// Sources (cells, lists) own a registry and call
/// [`notify_all`](SubscriberRegistry::notify_all) whenever they mutate.
/// Consumers attach through [`subscribe`](SubscriberRegistry::subscribe) or
/// through the [`ChangeStream`] returned by
/// [`stream`](SubscriberRegistry::stream).
///
/// # Examples
///
/// ```rust
/// use obsweave::model::ChangeEvent;
/// use obsweave::notify::SubscriberRegistry;
/// use serde_json::json;
///
/// let registry = SubscriberRegistry::new();
///
/// let handle = registry.subscribe(|event| {
///     println!("{} at {:?}", event.action, event.path);
/// });
///
/// // Notify all subscribers
/// registry.notify_all(&ChangeEvent::add(json!("first")));
///
/// // Unsubscribe by dropping the handle
/// drop(handle);
/// assert_eq!(registry.subscriber_count(), 0);
/// ```
pub struct SubscriberRegistry {
    inner: Arc<Mutex<SubscriberRegistryInner>>,
}

impl SubscriberRegistry {
    /// Create a new subscriber registry.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SubscriberRegistryInner {
                subscribers: Vec::new(),
                next_id: 0,
            })),
        }
    }

    /// Subscribe to events from this source.
    ///
    /// Returns a handle that can be dropped to unsubscribe.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        self.subscribe_listener(Arc::new(callback))
    }

    /// Subscribe an already shared listener.
    pub fn subscribe_listener(&self, listener: Listener) -> Subscription {
        let id = {
            let mut inner = self.inner.lock();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.subscribers.push((id, listener));
            id
        };

        let registry: Weak<Mutex<SubscriberRegistryInner>> = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = registry.upgrade() {
                inner.lock().subscribers.retain(|(sub_id, _)| *sub_id != id);
            }
        })
    }

    /// Deliver `event` to every subscriber, in subscription order.
    ///
    /// Listeners run without the registry lock held, so they may subscribe or
    /// unsubscribe while being notified.
    pub fn notify_all(&self, event: &ChangeEvent) {
        let listeners: Vec<Listener> = {
            let inner = self.inner.lock();
            inner
                .subscribers
                .iter()
                .map(|(_, listener)| Arc::clone(listener))
                .collect()
        };

        tracing::trace!(
            path = %event.path,
            action = %event.action,
            subscribers = listeners.len(),
            "notifying subscribers"
        );

        for listener in listeners {
            listener(event);
        }
    }

    /// Get the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().subscribers.len()
    }

    /// A stream whose subscriptions attach to this registry.
    pub fn stream(&self) -> ChangeStream {
        let registry = self.clone();
        ChangeStream::from_fn(move |listener: Listener| registry.subscribe_listener(listener))
    }
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for SubscriberRegistry {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn event() -> ChangeEvent {
        ChangeEvent::change(json!(1), json!(0))
    }

    #[test]
    fn test_subscribe_and_notify() {
        let registry = SubscriberRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let counter_clone = Arc::clone(&counter);
        let _handle = registry.subscribe(move |_| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        registry.notify_all(&event());
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        registry.notify_all(&event());
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_multiple_subscribers() {
        let registry = SubscriberRegistry::new();
        let counter1 = Arc::new(AtomicUsize::new(0));
        let counter2 = Arc::new(AtomicUsize::new(0));

        let counter1_clone = Arc::clone(&counter1);
        let _handle1 = registry.subscribe(move |_| {
            counter1_clone.fetch_add(1, Ordering::SeqCst);
        });

        let counter2_clone = Arc::clone(&counter2);
        let _handle2 = registry.subscribe(move |_| {
            counter2_clone.fetch_add(1, Ordering::SeqCst);
        });

        registry.notify_all(&event());
        assert_eq!(counter1.load(Ordering::SeqCst), 1);
        assert_eq!(counter2.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe() {
        let registry = SubscriberRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let counter_clone = Arc::clone(&counter);
        let handle = registry.subscribe(move |_| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        registry.notify_all(&event());
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        // Unsubscribe by dropping handle
        drop(handle);

        registry.notify_all(&event());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_subscriber_count() {
        let registry = SubscriberRegistry::new();
        assert_eq!(registry.subscriber_count(), 0);

        let handle1 = registry.subscribe(|_| {});
        assert_eq!(registry.subscriber_count(), 1);

        let _handle2 = registry.subscribe(|_| {});
        assert_eq!(registry.subscriber_count(), 2);

        drop(handle1);
        assert_eq!(registry.subscriber_count(), 1);
    }

    #[test]
    fn test_clone_registry() {
        let registry = SubscriberRegistry::new();
        let registry2 = registry.clone();

        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = Arc::clone(&counter);
        let _handle = registry.subscribe(move |_| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        // Notify via clone
        registry2.notify_all(&event());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_handle_outlives_registry() {
        let registry = SubscriberRegistry::new();
        let handle = registry.subscribe(|_| {});
        drop(registry);
        drop(handle);
    }

    #[test]
    fn test_listener_may_unsubscribe_during_notify() {
        let registry = SubscriberRegistry::new();
        let slot: Arc<parking_lot::Mutex<Option<Subscription>>> =
            Arc::new(parking_lot::Mutex::new(None));

        let slot_clone = Arc::clone(&slot);
        let handle = registry.subscribe(move |_| {
            slot_clone.lock().take();
        });
        *slot.lock() = Some(handle);

        registry.notify_all(&event());
        assert_eq!(registry.subscriber_count(), 0);
    }
}
