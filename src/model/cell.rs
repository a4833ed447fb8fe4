//! Scalar value holder with lock-free reads and change notification.

use crate::error::Result;
use crate::model::{ChangeEvent, Field, Observed};
use crate::notify::{ChangeStream, SubscriberRegistry};
use arc_swap::ArcSwap;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// An observed scalar field.
///
/// The value lives in an `ArcSwap`, so reads never block writers or other
/// readers. Every [`set`](ObservedCell::set) emits an
/// [`Action::Change`](crate::model::Action::Change) event carrying the new and
/// old values as JSON, with an empty path.
///
/// # Examples
///
/// ```rust
/// use obsweave::model::{ObservedCell, Observed};
/// use std::sync::{Arc, Mutex};
///
/// # fn example() -> obsweave::error::Result<()> {
/// let port = ObservedCell::new(8080u16);
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = Arc::clone(&seen);
/// let _subscription = port.changes().subscribe(move |event| {
///     sink.lock().unwrap().push(event.old_value.clone());
/// });
///
/// port.set(9090)?;
/// assert_eq!(*port.get(), 9090);
/// assert_eq!(seen.lock().unwrap()[0], Some(serde_json::json!(8080)));
/// # Ok(())
/// # }
/// ```
pub struct ObservedCell<T> {
    /// The current value, wrapped in ArcSwap for atomic updates
    current: Arc<ArcSwap<T>>,
    /// Subscriber registry for change notifications
    subscribers: SubscriberRegistry,
    model_name: Arc<str>,
}

impl<T> ObservedCell<T>
where
    T: Serialize + Send + Sync + 'static,
{
    /// Create a cell named after its value type.
    pub fn new(initial: T) -> Self {
        Self::named(short_type_name::<T>(), initial)
    }

    /// Create a cell with an explicit model name.
    pub fn named(model_name: impl Into<Arc<str>>, initial: T) -> Self {
        Self {
            current: Arc::new(ArcSwap::new(Arc::new(initial))),
            subscribers: SubscriberRegistry::new(),
            model_name: model_name.into(),
        }
    }

    /// Get a reference-counted handle to the current value.
    pub fn get(&self) -> Arc<T> {
        self.current.load_full()
    }

    /// Replace the value and notify subscribers.
    ///
    /// # Errors
    ///
    /// Returns an error if the new or the current value cannot be serialized;
    /// the current value is kept and no event is emitted in that case.
    pub fn set(&self, value: T) -> Result<()> {
        let model = serde_json::to_value(&value)?;
        let next = Arc::new(value);

        loop {
            let current = self.current.load_full();
            let old_value = serde_json::to_value(&*current)?;

            // Only swap if no other writer got in since the old value was read
            let previous = self.current.compare_and_swap(&current, Arc::clone(&next));
            if Arc::ptr_eq(&*previous, &current) {
                self.subscribers
                    .notify_all(&ChangeEvent::change(model, old_value));
                return Ok(());
            }
        }
    }

    /// Derive the next value from the current one and set it.
    ///
    /// # Errors
    ///
    /// Same as [`set`](ObservedCell::set).
    pub fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&T) -> T,
    {
        let next = f(&self.current.load());
        self.set(next)
    }

    /// Get the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.subscriber_count()
    }
}

impl<T> Observed for ObservedCell<T>
where
    T: Serialize + Send + Sync + 'static,
{
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn field(&self, _name: &str) -> Option<Field> {
        None
    }

    fn changes(&self) -> ChangeStream {
        self.subscribers.stream()
    }

    fn snapshot(&self) -> Value {
        serde_json::to_value(&*self.get()).unwrap_or_else(|e| {
            tracing::warn!(model = %self.model_name, error = %e, "failed to snapshot cell");
            Value::Null
        })
    }
}

impl<T> Clone for ObservedCell<T> {
    fn clone(&self) -> Self {
        Self {
            current: Arc::clone(&self.current),
            subscribers: self.subscribers.clone(),
            model_name: Arc::clone(&self.model_name),
        }
    }
}

impl<T> From<Arc<ObservedCell<T>>> for Field
where
    T: Serialize + Send + Sync + 'static,
{
    fn from(cell: Arc<ObservedCell<T>>) -> Self {
        Field::Object(cell)
    }
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
