//! Change notification plumbing.
//!
//! Provides the subscriber registry owned by every change source, the
//! composable [`ChangeStream`] built on top of it, and an async bridge for
//! consumers running on tokio.

pub mod registry;
pub mod stream;

#[cfg(feature = "tokio-runtime")]
pub mod receiver;

#[cfg(feature = "tokio-runtime")]
pub use receiver::EventReceiver;
pub use registry::SubscriberRegistry;
pub use stream::{ChangeStream, Listener, Subscription};
