//! Observed list with element-level watching.

use crate::core::generate_stream;
use crate::error::{ObserveError, Result};
use crate::model::{ChangeEvent, Field, Observed, ObservedList};
use crate::notify::{ChangeStream, Subscription, SubscriberRegistry};
use crate::tree::ConfigNode;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// An observed list of observed elements.
///
/// Mutations emit [`Action::Add`](crate::model::Action::Add),
/// [`Action::Remove`](crate::model::Action::Remove) and
/// [`Action::Clear`](crate::model::Action::Clear) events with an empty path.
///
/// Once a non-empty element configuration is set through
/// [`ObservedList::set_subscription_config`], every current and future element
/// is watched with that configuration and its events are re-emitted on the
/// list stream with the element's current index prepended to the path.
/// The configuration belongs to the list, so the most recent composition that
/// touched the list decides what is watched.
///
/// Element watches are owned by the list, not by subscribers of its stream.
/// Once every subscriber is gone they stay attached to the elements and forward
/// into an empty registry, until the element leaves the list or the
/// configuration changes. Call `set_subscription_config(&[])` to detach them.
///
/// # Examples
///
/// ```rust
/// use obsweave::model::{ObservedCell, ObservedList, ObservedRecord, ObservedVec};
/// use obsweave::tree::ConfigNode;
/// use std::sync::{Arc, Mutex};
///
/// # fn example() -> obsweave::error::Result<()> {
/// let label = Arc::new(ObservedCell::new("urgent"));
/// let tag = ObservedRecord::builder("Tag").field("label", Arc::clone(&label)).build();
///
/// let tags = ObservedVec::new();
/// tags.push(tag)?;
/// tags.set_subscription_config(&[ConfigNode::new("label")])?;
///
/// let paths = Arc::new(Mutex::new(Vec::new()));
/// let sink = Arc::clone(&paths);
/// let _subscription = tags.changes().subscribe(move |event| {
///     sink.lock().unwrap().push(event.path.clone());
/// });
///
/// label.set("later")?;
/// assert_eq!(*paths.lock().unwrap(), vec!["0.label"]);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ObservedVec {
    inner: Arc<ListInner>,
}

struct ListInner {
    entries: Mutex<Vec<Entry>>,
    // Held while element watches are created so a push cannot race a reconfiguration.
    watch_config: Mutex<Vec<ConfigNode>>,
    subscribers: SubscriberRegistry,
    next_id: AtomicU64,
}

struct Entry {
    id: u64,
    element: Arc<dyn Observed>,
    watch: Option<Subscription>,
}

impl ListInner {
    fn position(&self, id: u64) -> Option<usize> {
        self.entries.lock().iter().position(|entry| entry.id == id)
    }
}

impl ObservedVec {
    /// Create an empty list.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ListInner {
                entries: Mutex::new(Vec::new()),
                watch_config: Mutex::new(Vec::new()),
                subscribers: SubscriberRegistry::new(),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Append an element.
    ///
    /// # Errors
    ///
    /// Fails when the current element configuration does not apply to
    /// `element`; the list is left unchanged.
    pub fn push(&self, element: Arc<dyn Observed>) -> Result<()> {
        let watch_config = self.inner.watch_config.lock();
        let (entry, snapshot) = self.prepare(element, &watch_config)?;
        self.inner.entries.lock().push(entry);
        drop(watch_config);

        self.inner.subscribers.notify_all(&ChangeEvent::add(snapshot));
        Ok(())
    }

    /// Insert an element at `index`, shifting later elements.
    ///
    /// # Errors
    ///
    /// Fails when `index > len()` or when the element configuration does not
    /// apply to `element`.
    pub fn insert(&self, index: usize, element: Arc<dyn Observed>) -> Result<()> {
        let watch_config = self.inner.watch_config.lock();
        let (entry, snapshot) = self.prepare(element, &watch_config)?;
        {
            let mut entries = self.inner.entries.lock();
            if index > entries.len() {
                return Err(ObserveError::IndexOutOfBounds {
                    index,
                    len: entries.len(),
                });
            }
            entries.insert(index, entry);
        }
        drop(watch_config);

        self.inner.subscribers.notify_all(&ChangeEvent::add(snapshot));
        Ok(())
    }

    /// Remove and return the element at `index`.
    pub fn remove(&self, index: usize) -> Option<Arc<dyn Observed>> {
        let entry = {
            let mut entries = self.inner.entries.lock();
            if index >= entries.len() {
                return None;
            }
            entries.remove(index)
        };
        let Entry { element, watch, .. } = entry;
        drop(watch);

        self.inner
            .subscribers
            .notify_all(&ChangeEvent::remove(element.snapshot()));
        Some(element)
    }

    /// Remove every element.
    pub fn clear(&self) {
        let removed = std::mem::take(&mut *self.inner.entries.lock());
        let snapshots: Vec<Value> = removed
            .into_iter()
            .map(|Entry { element, watch, .. }| {
                drop(watch);
                element.snapshot()
            })
            .collect();

        self.inner
            .subscribers
            .notify_all(&ChangeEvent::clear(Value::Array(snapshots)));
    }

    /// Element at `index`.
    pub fn get(&self, index: usize) -> Option<Arc<dyn Observed>> {
        self.inner
            .entries
            .lock()
            .get(index)
            .map(|entry| Arc::clone(&entry.element))
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.inner.entries.lock().len()
    }

    /// Returns true when the list has no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.subscriber_count()
    }

    fn prepare(
        &self,
        element: Arc<dyn Observed>,
        watch_config: &[ConfigNode],
    ) -> Result<(Entry, Value)> {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let watch = watch_element(&self.inner, id, element.as_ref(), watch_config)?;
        let snapshot = element.snapshot();
        Ok((Entry { id, element, watch }, snapshot))
    }
}

/// Subscribe to `element` with `children` and forward its events to the list.
fn watch_element(
    list: &Arc<ListInner>,
    id: u64,
    element: &dyn Observed,
    children: &[ConfigNode],
) -> Result<Option<Subscription>> {
    if children.is_empty() {
        return Ok(None);
    }

    let stream = generate_stream(element, children, false)?;
    let list: Weak<ListInner> = Arc::downgrade(list);
    let subscription = stream.subscribe(move |event| {
        let Some(list) = list.upgrade() else {
            return;
        };
        // Index is looked up at emission time since earlier removals shift it.
        if let Some(index) = list.position(id) {
            list.subscribers
                .notify_all(&event.clone().with_prefix(&index.to_string()));
        }
    });
    Ok(Some(subscription))
}

impl ObservedList for ObservedVec {
    fn set_subscription_config(&self, children: &[ConfigNode]) -> Result<()> {
        let mut watch_config = self.inner.watch_config.lock();

        let targets: Vec<(u64, Arc<dyn Observed>)> = self
            .inner
            .entries
            .lock()
            .iter()
            .map(|entry| (entry.id, Arc::clone(&entry.element)))
            .collect();

        let mut fresh = Vec::with_capacity(targets.len());
        for (id, element) in &targets {
            fresh.push((*id, watch_element(&self.inner, *id, element.as_ref(), children)?));
        }

        let mut stale = Vec::with_capacity(fresh.len());
        {
            let mut entries = self.inner.entries.lock();
            for (id, watch) in fresh {
                if let Some(entry) = entries.iter_mut().find(|entry| entry.id == id) {
                    stale.push(std::mem::replace(&mut entry.watch, watch));
                }
            }
        }
        *watch_config = children.to_vec();
        drop(watch_config);
        drop(stale);

        tracing::debug!(
            elements = targets.len(),
            fields = children.len(),
            "reconfigured element watching"
        );
        Ok(())
    }

    fn subscription_config(&self) -> Vec<ConfigNode> {
        self.inner.watch_config.lock().clone()
    }

    fn changes(&self) -> ChangeStream {
        self.inner.subscribers.stream()
    }

    fn snapshot(&self) -> Value {
        Value::Array(
            self.inner
                .entries
                .lock()
                .iter()
                .map(|entry| entry.element.snapshot())
                .collect(),
        )
    }
}

impl Default for ObservedVec {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Arc<ObservedVec>> for Field {
    fn from(list: Arc<ObservedVec>) -> Self {
        Field::List(list)
    }
}
