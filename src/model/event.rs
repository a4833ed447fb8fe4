//! The change event flowing through every stream.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Kind of mutation carried by a [`ChangeEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// A scalar or reference field was replaced
    Change,
    /// An element was added to a list
    Add,
    /// An element was removed from a list
    Remove,
    /// A list was emptied
    Clear,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::Change => "change",
            Action::Add => "add",
            Action::Remove => "remove",
            Action::Clear => "clear",
        };
        f.write_str(name)
    }
}

/// A single reported mutation.
///
/// Sources emit events with an empty `path`. Each composition level the event
/// passes through prepends the field name it was reached by, so a subscriber
/// sees the full dotted location of the mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Dotted location of the mutation, relative to the subscribed stream
    pub path: String,
    /// What happened
    pub action: Action,
    /// New value for changes, affected element (or removed elements) for list events
    pub model: Value,
    /// Previous value, present only for [`Action::Change`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<Value>,
}

impl ChangeEvent {
    /// A field was replaced: `model` is the new value.
    pub fn change(model: Value, old_value: Value) -> Self {
        Self {
            path: String::new(),
            action: Action::Change,
            model,
            old_value: Some(old_value),
        }
    }

    /// An element was added.
    pub fn add(model: Value) -> Self {
        Self::list_event(Action::Add, model)
    }

    /// An element was removed.
    pub fn remove(model: Value) -> Self {
        Self::list_event(Action::Remove, model)
    }

    /// A list was cleared: `model` holds the removed elements.
    pub fn clear(model: Value) -> Self {
        Self::list_event(Action::Clear, model)
    }

    fn list_event(action: Action, model: Value) -> Self {
        Self {
            path: String::new(),
            action,
            model,
            old_value: None,
        }
    }

    /// Prepend `prop` to the path.
    ///
    /// ```rust
    /// use obsweave::model::ChangeEvent;
    /// use serde_json::json;
    ///
    /// let event = ChangeEvent::add(json!(1)).with_prefix("tags");
    /// assert_eq!(event.path, "tags");
    ///
    /// let event = event.with_prefix("profile");
    /// assert_eq!(event.path, "profile.tags");
    /// ```
    pub fn with_prefix(mut self, prop: &str) -> Self {
        self.path = prefix_path(prop, &self.path);
        self
    }

    /// Iterate over the dotted path segments.
    pub fn path_segments(&self) -> impl Iterator<Item = &str> {
        self.path.split('.').filter(|s| !s.is_empty())
    }
}

/// Join `prop` in front of `path`, omitting the dot when `path` is empty.
pub fn prefix_path(prop: &str, path: &str) -> String {
    if path.is_empty() {
        prop.to_string()
    } else {
        format!("{prop}.{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_prefix_path() {
        assert_eq!(prefix_path("a", ""), "a");
        assert_eq!(prefix_path("a", "b"), "a.b");
        assert_eq!(prefix_path("a", "b.c"), "a.b.c");
    }

    #[test]
    fn test_depth_accumulates_prefixes() {
        let event = ChangeEvent::change(json!("Oslo"), json!("Bergen"))
            .with_prefix("city")
            .with_prefix("address")
            .with_prefix("Profile");
        assert_eq!(event.path, "Profile.address.city");
        assert_eq!(
            event.path_segments().collect::<Vec<_>>(),
            vec!["Profile", "address", "city"]
        );
    }

    #[test]
    fn test_list_events_have_no_old_value() {
        assert_eq!(ChangeEvent::add(json!(1)).old_value, None);
        assert_eq!(ChangeEvent::remove(json!(1)).action, Action::Remove);
        assert_eq!(ChangeEvent::clear(json!([1, 2])).action, Action::Clear);
    }

    #[test]
    fn test_serialized_shape() {
        let event = ChangeEvent::change(json!(2), json!(1)).with_prefix("count");
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"path": "count", "action": "change", "model": 2, "old_value": 1})
        );

        let event = ChangeEvent::add(json!("x"));
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"path": "", "action": "add", "model": "x"})
        );
    }

    #[test]
    fn test_action_display() {
        assert_eq!(Action::Clear.to_string(), "clear");
    }
}
