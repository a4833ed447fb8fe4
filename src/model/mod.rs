//! Observed values and the events they emit.
//!
//! [`Observed`] and [`ObservedList`] are the seams the composer works
//! against. [`ObservedCell`], [`ObservedRecord`] and [`ObservedVec`] are ready
//! made implementations for scalars, objects and lists.

mod cell;
mod event;
mod list;
mod observed;
mod record;

pub use cell::ObservedCell;
pub use event::{Action, ChangeEvent, prefix_path};
pub use list::ObservedVec;
pub use observed::{Field, Observed, ObservedList};
pub use record::{ObservedRecord, ObservedRecordBuilder};
