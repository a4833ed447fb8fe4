//! Async consumption of change streams.

use crate::model::ChangeEvent;
use crate::notify::{ChangeStream, Subscription};
use tokio::sync::mpsc;

/// Receiving half of a stream bridged onto a tokio channel.
///
/// Created by [`ChangeStream::into_receiver`]. Events are queued without bound
/// in emission order. Dropping the receiver unsubscribes from the stream.
///
/// # Examples
///
/// ```rust,no_run
/// use obsweave::model::ChangeEvent;
/// use obsweave::notify::SubscriberRegistry;
/// use serde_json::json;
///
/// # async fn example() {
/// let registry = SubscriberRegistry::new();
/// let mut receiver = registry.stream().with_prefix("count").into_receiver();
///
/// registry.notify_all(&ChangeEvent::change(json!(2), json!(1)));
///
/// let event = receiver.recv().await.unwrap();
/// assert_eq!(event.path, "count");
/// # }
/// ```
pub struct EventReceiver {
    // Declared first so the listener is detached before the channel closes.
    subscription: Subscription,
    rx: mpsc::UnboundedReceiver<ChangeEvent>,
}

impl EventReceiver {
    pub(crate) fn new(stream: &ChangeStream) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = stream.subscribe(move |event| {
            if tx.send(event.clone()).is_err() {
                tracing::warn!(path = %event.path, "event receiver dropped, discarding event");
            }
        });

        Self { subscription, rx }
    }

    /// Wait for the next event.
    ///
    /// Returns `None` once every source of the stream has been dropped and the
    /// queue is drained. A quiet source keeps this pending, so pair it with a
    /// timeout where that matters.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        self.rx.recv().await
    }

    /// Take the next queued event without waiting.
    pub fn try_recv(&mut self) -> Option<ChangeEvent> {
        self.rx.try_recv().ok()
    }

    /// Take every queued event without waiting.
    pub fn drain(&mut self) -> Vec<ChangeEvent> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }

    /// Stop receiving new events, keeping the ones already queued.
    pub fn unsubscribe(&mut self) {
        std::mem::replace(&mut self.subscription, Subscription::empty()).unsubscribe();
    }
}
