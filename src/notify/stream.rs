//! Push-based change streams and their subscriptions.

use crate::model::ChangeEvent;
use std::fmt;
use std::sync::Arc;

#[cfg(feature = "tokio-runtime")]
use crate::notify::EventReceiver;

/// Callback invoked for every event delivered to a subscriber.
pub type Listener = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;

type SubscribeFn = dyn Fn(Listener) -> Subscription + Send + Sync;

/// Handle for an active subscription.
///
/// Dropping the handle (or calling [`Subscription::unsubscribe`]) detaches the
/// listener. A handle returned by a merged stream owns the handles of every
/// merged source, so one drop detaches from all of them.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    teardown: Teardown,
}

enum Teardown {
    Closed,
    Callback(Box<dyn FnOnce() + Send>),
    Group(Vec<Subscription>),
}

impl Subscription {
    /// Create a subscription that runs `teardown` when it is dropped.
    pub fn new<F>(teardown: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            teardown: Teardown::Callback(Box::new(teardown)),
        }
    }

    /// A subscription with nothing to release.
    pub fn empty() -> Self {
        Self {
            teardown: Teardown::Closed,
        }
    }

    /// Bundle several subscriptions so they are released together.
    pub fn group(subscriptions: Vec<Subscription>) -> Self {
        Self {
            teardown: Teardown::Group(subscriptions),
        }
    }

    /// Release the subscription now.
    pub fn unsubscribe(mut self) {
        self.release();
    }

    /// Returns true when there is nothing left to release.
    pub fn is_closed(&self) -> bool {
        matches!(self.teardown, Teardown::Closed)
    }

    fn release(&mut self) {
        match std::mem::replace(&mut self.teardown, Teardown::Closed) {
            Teardown::Closed => {}
            Teardown::Callback(teardown) => teardown(),
            Teardown::Group(subscriptions) => drop(subscriptions),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.teardown {
            Teardown::Closed => f.write_str("Subscription(closed)"),
            Teardown::Callback(_) => f.write_str("Subscription(active)"),
            Teardown::Group(group) => write!(f, "Subscription(group of {})", group.len()),
        }
    }
}

/// A push stream of [`ChangeEvent`]s.
///
/// A stream is a recipe for subscribing: nothing happens until
/// [`subscribe`](ChangeStream::subscribe) is called, and every call attaches
/// the listener to the underlying sources synchronously. Streams are cheap to
/// clone and can be combined with [`map`](ChangeStream::map),
/// [`with_prefix`](ChangeStream::with_prefix) and
/// [`merge`](ChangeStream::merge).
///
/// # Examples
///
/// ```rust
/// use obsweave::model::ChangeEvent;
/// use obsweave::notify::{ChangeStream, SubscriberRegistry};
/// use serde_json::json;
/// use std::sync::{Arc, Mutex};
///
/// let width = SubscriberRegistry::new();
/// let height = SubscriberRegistry::new();
/// let merged = ChangeStream::merge([
///     width.stream().with_prefix("width"),
///     height.stream().with_prefix("height"),
/// ]);
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = Arc::clone(&seen);
/// let subscription = merged.subscribe(move |event| sink.lock().unwrap().push(event.path.clone()));
///
/// width.notify_all(&ChangeEvent::change(json!(2), json!(1)));
/// height.notify_all(&ChangeEvent::change(json!(4), json!(3)));
/// assert_eq!(*seen.lock().unwrap(), vec!["width", "height"]);
///
/// subscription.unsubscribe();
/// assert_eq!(width.subscriber_count(), 0);
/// ```
#[derive(Clone)]
pub struct ChangeStream {
    subscribe_fn: Arc<SubscribeFn>,
}

impl ChangeStream {
    /// Create a stream from its subscribe function.
    pub fn from_fn<F>(subscribe_fn: F) -> Self
    where
        F: Fn(Listener) -> Subscription + Send + Sync + 'static,
    {
        Self {
            subscribe_fn: Arc::new(subscribe_fn),
        }
    }

    /// A stream that never emits.
    pub fn empty() -> Self {
        Self::from_fn(|_listener: Listener| Subscription::empty())
    }

    /// Attach `callback` to every source of this stream.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        self.subscribe_listener(Arc::new(callback))
    }

    /// Attach an already shared listener.
    pub fn subscribe_listener(&self, listener: Listener) -> Subscription {
        (self.subscribe_fn)(listener)
    }

    /// Transform every event flowing through the stream.
    pub fn map<F>(&self, transform: F) -> ChangeStream
    where
        F: Fn(ChangeEvent) -> ChangeEvent + Send + Sync + 'static,
    {
        let source = self.clone();
        let transform = Arc::new(transform);
        ChangeStream::from_fn(move |listener: Listener| {
            let transform = Arc::clone(&transform);
            source.subscribe(move |event: &ChangeEvent| listener(&transform(event.clone())))
        })
    }

    /// Prepend `prop` to the path of every event.
    ///
    /// An empty path becomes `prop`, any other path becomes `prop.path`.
    pub fn with_prefix(&self, prop: impl Into<String>) -> ChangeStream {
        let prop = prop.into();
        self.map(move |event| event.with_prefix(&prop))
    }

    /// Interleave several streams into one.
    ///
    /// Subscribing attaches the listener to every source in order; events
    /// arrive in whatever order the sources emit them. The returned
    /// subscription releases all sources at once.
    pub fn merge<I>(streams: I) -> ChangeStream
    where
        I: IntoIterator<Item = ChangeStream>,
    {
        let sources: Vec<ChangeStream> = streams.into_iter().collect();
        ChangeStream::from_fn(move |listener: Listener| {
            Subscription::group(
                sources
                    .iter()
                    .map(|source| source.subscribe_listener(Arc::clone(&listener)))
                    .collect(),
            )
        })
    }

    /// Interleave this stream with `other`.
    pub fn merge_with(&self, other: &ChangeStream) -> ChangeStream {
        Self::merge([self.clone(), other.clone()])
    }

    /// Bridge this stream onto an async channel.
    ///
    /// The receiver holds the subscription; dropping it unsubscribes.
    #[cfg(feature = "tokio-runtime")]
    pub fn into_receiver(&self) -> EventReceiver {
        EventReceiver::new(self)
    }
}

impl fmt::Debug for ChangeStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeStream").finish_non_exhaustive()
    }
}
