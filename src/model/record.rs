//! Named objects composed of observed fields.

use crate::model::{Field, Observed};
use crate::notify::ChangeStream;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::sync::Arc;

/// An observed object with a fixed, ordered set of named fields.
///
/// The record itself never changes shape; mutations happen inside its field
/// values. Its native stream merges every field's stream with the field name
/// prepended to each event path.
///
/// # Examples
///
/// ```rust
/// use obsweave::model::{ObservedCell, ObservedRecord, Observed};
/// use std::sync::Arc;
///
/// let city = Arc::new(ObservedCell::new("Bergen".to_string()));
/// let address = ObservedRecord::builder("Address")
///     .field("city", Arc::clone(&city))
///     .build();
/// let profile = ObservedRecord::builder("Profile")
///     .field("name", Arc::new(ObservedCell::new("Ada".to_string())))
///     .field("address", address)
///     .build();
///
/// assert_eq!(profile.model_name(), "Profile");
/// assert_eq!(profile.snapshot()["address"]["city"], "Bergen");
/// ```
pub struct ObservedRecord {
    name: String,
    fields: IndexMap<String, Field>,
}

impl ObservedRecord {
    /// Start building a record with the given model name.
    pub fn builder(name: impl Into<String>) -> ObservedRecordBuilder {
        ObservedRecordBuilder {
            name: name.into(),
            fields: IndexMap::new(),
        }
    }

    /// Field names in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Borrow a field without cloning its handle.
    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }
}

impl Observed for ObservedRecord {
    fn model_name(&self) -> &str {
        &self.name
    }

    fn field(&self, name: &str) -> Option<Field> {
        self.fields.get(name).cloned()
    }

    fn changes(&self) -> ChangeStream {
        ChangeStream::merge(
            self.fields
                .iter()
                .map(|(name, field)| field.changes().with_prefix(name.clone())),
        )
    }

    fn snapshot(&self) -> Value {
        let map: Map<String, Value> = self
            .fields
            .iter()
            .map(|(name, field)| (name.clone(), field.snapshot()))
            .collect();
        Value::Object(map)
    }
}

impl From<Arc<ObservedRecord>> for Field {
    fn from(record: Arc<ObservedRecord>) -> Self {
        Field::Object(record)
    }
}

/// Builder for [`ObservedRecord`].
pub struct ObservedRecordBuilder {
    name: String,
    fields: IndexMap<String, Field>,
}

impl ObservedRecordBuilder {
    /// Add a field. A later field with the same name replaces the earlier one.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Field>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Finish the record.
    pub fn build(self) -> Arc<ObservedRecord> {
        Arc::new(ObservedRecord {
            name: self.name,
            fields: self.fields,
        })
    }
}
