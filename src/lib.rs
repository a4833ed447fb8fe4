//! # obsweave
//!
//! One subscription for every change in an object graph.
//!
//! ## Overview
//!
//! `obsweave` composes the change streams of individual fields into a single
//! stream whose events carry a dotted path to where the change happened:
//! - Watch trees describe which fields (and fields of fields) to observe
//! - Trees can be written in a small indentation language
//! - Lists propagate the watch tree to their elements
//! - Dropping the subscription detaches from every field at once
//!
//! ## Quick Start
//!
//! ```rust
//! use obsweave::prelude::*;
//! use std::sync::Arc;
//!
//! # fn example() -> obsweave::error::Result<()> {
//! let city = Arc::new(ObservedCell::new("Bergen".to_string()));
//! let tags = Arc::new(ObservedVec::new());
//! let profile = ObservedRecord::builder("Profile")
//!     .field("name", Arc::new(ObservedCell::new("Ada".to_string())))
//!     .field("address", ObservedRecord::builder("Address").field("city", Arc::clone(&city)).build())
//!     .field("tags", Arc::clone(&tags))
//!     .build();
//!
//! // Watch the city and the tag list
//! let stream = change_stream(profile.as_ref(), "address\n  city\ntags")?;
//! let _subscription = stream.subscribe(|event| {
//!     println!("{} {} -> {}", event.action, event.path, event.model);
//! });
//!
//! city.set("Oslo".to_string())?;                        // change Profile.address.city -> "Oslo"
//! tags.push(Arc::new(ObservedCell::new("admin")))?;     // add Profile.tags -> "admin"
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `tokio-runtime` (default): [`ChangeStream::into_receiver`](notify::ChangeStream::into_receiver)
//!   bridges a stream onto a tokio channel for async consumers.

#![warn(missing_docs, rust_2024_compatibility)]
#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod model;
pub mod notify;
pub mod tree;

/// Convenient re-exports for common usage patterns.
pub mod prelude {
    pub use crate::core::{Composer, ComposerSettings, change_stream};
    pub use crate::error::{ObserveError, Result};
    pub use crate::model::{
        Action, ChangeEvent, Field, Observed, ObservedCell, ObservedList, ObservedRecord,
        ObservedVec,
    };
    pub use crate::notify::{ChangeStream, Subscription};
    pub use crate::tree::{ConfigNode, ConfigTreeBuilder};

    #[cfg(feature = "tokio-runtime")]
    pub use crate::notify::EventReceiver;
}
