//! Traits implemented by everything the composer can watch.

use crate::error::Result;
use crate::notify::ChangeStream;
use crate::tree::ConfigNode;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// An object that reports changes to its fields.
///
/// Implementors expose a stable model name, resolve their fields by name and
/// provide one stream carrying every change they make. Events on that stream
/// name the changed field in their path (empty for a scalar that is its own
/// value).
///
/// # Examples
///
/// ```rust
/// use obsweave::model::{Field, Observed};
/// use obsweave::notify::{ChangeStream, SubscriberRegistry};
/// use serde_json::{Value, json};
///
/// struct Thermometer {
///     registry: SubscriberRegistry,
/// }
///
/// impl Observed for Thermometer {
///     fn model_name(&self) -> &str {
///         "Thermometer"
///     }
///
///     fn field(&self, _name: &str) -> Option<Field> {
///         None
///     }
///
///     fn changes(&self) -> ChangeStream {
///         self.registry.stream()
///     }
///
///     fn snapshot(&self) -> Value {
///         json!({})
///     }
/// }
/// ```
pub trait Observed: Send + Sync {
    /// Identity or type name of the object.
    fn model_name(&self) -> &str;

    /// Resolve a field by name, `None` when it does not exist.
    fn field(&self, name: &str) -> Option<Field>;

    /// Stream of every change made to this object.
    fn changes(&self) -> ChangeStream;

    /// Current value as JSON.
    fn snapshot(&self) -> Value;
}

/// A collection whose elements can be watched.
pub trait ObservedList: Send + Sync {
    /// Replace the element watch configuration.
    ///
    /// With non-empty `children`, element changes matching the configuration
    /// are re-emitted on [`changes`](ObservedList::changes). Empty `children`
    /// stops element watching.
    ///
    /// # Errors
    ///
    /// Fails when the configuration cannot be applied to a current element;
    /// the previous configuration is then kept.
    fn set_subscription_config(&self, children: &[ConfigNode]) -> Result<()>;

    /// The element configuration currently applied, empty when elements are
    /// not watched.
    fn subscription_config(&self) -> Vec<ConfigNode>;

    /// Stream of add, remove and clear events, plus watched element changes.
    fn changes(&self) -> ChangeStream;

    /// Current elements as a JSON array.
    fn snapshot(&self) -> Value;
}

/// A resolved field, tagged by the kind of value it holds.
#[derive(Clone)]
pub enum Field {
    /// A scalar or nested object
    Object(Arc<dyn Observed>),
    /// A list-like collection
    List(Arc<dyn ObservedList>),
}

impl Field {
    /// Native change stream of the field's value.
    pub fn changes(&self) -> ChangeStream {
        match self {
            Field::Object(value) => value.changes(),
            Field::List(list) => list.changes(),
        }
    }

    /// Current value of the field as JSON.
    pub fn snapshot(&self) -> Value {
        match self {
            Field::Object(value) => value.snapshot(),
            Field::List(list) => list.snapshot(),
        }
    }

    /// Returns true for list-like fields.
    pub fn is_list(&self) -> bool {
        matches!(self, Field::List(_))
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Object(value) => write!(f, "Field::Object({})", value.model_name()),
            Field::List(_) => f.write_str("Field::List"),
        }
    }
}

impl From<Arc<dyn Observed>> for Field {
    fn from(value: Arc<dyn Observed>) -> Self {
        Field::Object(value)
    }
}

impl From<Arc<dyn ObservedList>> for Field {
    fn from(list: Arc<dyn ObservedList>) -> Self {
        Field::List(list)
    }
}
