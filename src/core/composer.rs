//! Recursive composition of field streams into one path-annotated stream.

use crate::core::ComposerSettings;
use crate::error::{ObserveError, Result};
use crate::model::{Field, Observed, ObservedList};
use crate::notify::ChangeStream;
use crate::tree::ConfigNode;
use std::sync::Arc;

/// Anything that can describe a watch tree for a given root.
///
/// Implemented for ready-made [`ConfigNode`] trees and for text in the
/// indentation language, which is parsed with the composer's delimiters and the
/// root's model name.
pub trait IntoConfigTree {
    /// Produce the watch tree, naming the root `root_name` when it is built here.
    ///
    /// # Errors
    ///
    /// Returns an error if text cannot be parsed.
    fn into_config_tree(self, root_name: &str, settings: &ComposerSettings) -> Result<ConfigNode>;
}

impl IntoConfigTree for ConfigNode {
    fn into_config_tree(self, _root_name: &str, _settings: &ComposerSettings) -> Result<ConfigNode> {
        Ok(self)
    }
}

impl IntoConfigTree for &ConfigNode {
    fn into_config_tree(self, _root_name: &str, _settings: &ComposerSettings) -> Result<ConfigNode> {
        Ok(self.clone())
    }
}

impl IntoConfigTree for &str {
    fn into_config_tree(self, root_name: &str, settings: &ComposerSettings) -> Result<ConfigNode> {
        settings.tree_builder(root_name).build(self)
    }
}

impl IntoConfigTree for String {
    fn into_config_tree(self, root_name: &str, settings: &ComposerSettings) -> Result<ConfigNode> {
        self.as_str().into_config_tree(root_name, settings)
    }
}

impl IntoConfigTree for &String {
    fn into_config_tree(self, root_name: &str, settings: &ComposerSettings) -> Result<ConfigNode> {
        self.as_str().into_config_tree(root_name, settings)
    }
}

/// Builds unified change streams for object graphs.
///
/// # Examples
///
/// ```rust
/// use obsweave::prelude::*;
/// use std::sync::{Arc, Mutex};
///
/// # fn example() -> obsweave::error::Result<()> {
/// let city = Arc::new(ObservedCell::new("Bergen".to_string()));
/// let profile = ObservedRecord::builder("Profile")
///     .field("name", Arc::new(ObservedCell::new("Ada".to_string())))
///     .field("address", ObservedRecord::builder("Address").field("city", Arc::clone(&city)).build())
///     .build();
///
/// let stream = Composer::new().change_stream(profile.as_ref(), "address\n  city")?;
///
/// let paths = Arc::new(Mutex::new(Vec::new()));
/// let sink = Arc::clone(&paths);
/// let _subscription = stream.subscribe(move |event| sink.lock().unwrap().push(event.path.clone()));
///
/// city.set("Oslo".to_string())?;
/// assert_eq!(*paths.lock().unwrap(), vec!["Profile.address.city"]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Composer {
    settings: ComposerSettings,
}

impl Composer {
    /// Create a composer with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a composer with the given settings.
    pub fn with_settings(settings: ComposerSettings) -> Self {
        Self { settings }
    }

    /// The settings used to parse text watches.
    pub fn settings(&self) -> &ComposerSettings {
        &self.settings
    }

    /// Build one stream reporting every change selected by `config`.
    ///
    /// Text is parsed first, with `root.model_name()` as the root name. A tree
    /// without children selects everything the root reports natively. Every
    /// event path starts with the tree's root name.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The watch text cannot be parsed
    /// - A configured field does not exist on the object it is looked up on
    /// - A list rejects its element configuration
    ///
    /// No stream is returned when any of these happen.
    pub fn change_stream<O>(&self, root: &O, config: impl IntoConfigTree) -> Result<ChangeStream>
    where
        O: Observed + ?Sized,
    {
        let tree = config.into_config_tree(root.model_name(), &self.settings)?;
        let full_detection = tree.is_leaf();

        tracing::debug!(
            model = root.model_name(),
            root = %tree.name,
            fields = tree.descendant_count(),
            full_detection,
            "composing change stream"
        );

        let stream = generate_stream(root, &tree.children, full_detection)?;
        Ok(stream.with_prefix(tree.name))
    }

    /// Compose the watch named `name` in the settings.
    ///
    /// # Errors
    ///
    /// Returns [`ObserveError::UnknownWatch`] when the settings define no such
    /// watch, otherwise the errors of [`change_stream`](Composer::change_stream).
    pub fn watch<O>(&self, root: &O, name: &str) -> Result<ChangeStream>
    where
        O: Observed + ?Sized,
    {
        let text = self
            .settings
            .watches
            .get(name)
            .ok_or_else(|| ObserveError::UnknownWatch(name.to_string()))?;
        self.change_stream(root, text)
    }
}

/// Compose a change stream with default settings.
///
/// See [`Composer::change_stream`].
///
/// # Errors
///
/// Same as [`Composer::change_stream`].
pub fn change_stream<O>(root: &O, config: impl IntoConfigTree) -> Result<ChangeStream>
where
    O: Observed + ?Sized,
{
    Composer::new().change_stream(root, config)
}

/// Recursively merge the streams of `children` on `obj`.
///
/// With `full_detection` the object's native stream is returned as is.
/// Otherwise each configured field contributes one stream, prefixed with the
/// field name:
///
/// - list fields receive `child.children` as their element configuration and
///   contribute their own stream;
/// - object fields with configured children are composed recursively;
/// - other object fields contribute their native stream.
///
/// Every configured object field is resolved before any list is touched. If a
/// list later rejects its element configuration, lists already configured by
/// this call get their previous configuration back.
///
/// # Errors
///
/// Returns [`ObserveError::Config`] when `full_detection` is off and
/// `children` is empty, [`ObserveError::Resolution`] when a field does not
/// exist on the object it is looked up on, and any error a list raises while
/// applying its element configuration.
pub fn generate_stream<O>(
    obj: &O,
    children: &[ConfigNode],
    full_detection: bool,
) -> Result<ChangeStream>
where
    O: Observed + ?Sized,
{
    if full_detection {
        return Ok(obj.changes());
    }
    if children.is_empty() {
        return Err(ObserveError::Config(
            "configArray cannot be null or empty when fullDetection is false".to_string(),
        ));
    }

    resolve_fields(obj, children)?;

    let mut configured = Vec::new();
    compose_fields(obj, children, &mut configured).inspect_err(|err| {
        for (list, previous) in configured.into_iter().rev() {
            if let Err(restore) = list.set_subscription_config(&previous) {
                tracing::warn!(error = %restore, "failed to restore list configuration");
            }
        }
        tracing::debug!(model = obj.model_name(), error = %err, "composition aborted");
    })
}

/// A list touched by a composition, with the configuration it had before.
type ConfiguredList = (Arc<dyn ObservedList>, Vec<ConfigNode>);

fn resolve<O>(obj: &O, child: &ConfigNode) -> Result<Field>
where
    O: Observed + ?Sized,
{
    obj.field(&child.name)
        .ok_or_else(|| ObserveError::resolution(obj.model_name(), &child.name))
}

/// Check that every object field named by `children` exists, without side effects.
fn resolve_fields<O>(obj: &O, children: &[ConfigNode]) -> Result<()>
where
    O: Observed + ?Sized,
{
    for child in children {
        if let Field::Object(value) = resolve(obj, child)? {
            if !child.is_leaf() {
                resolve_fields(value.as_ref(), &child.children)?;
            }
        }
    }
    Ok(())
}

fn compose_fields<O>(
    obj: &O,
    children: &[ConfigNode],
    configured: &mut Vec<ConfiguredList>,
) -> Result<ChangeStream>
where
    O: Observed + ?Sized,
{
    let mut contributions = Vec::with_capacity(children.len());
    for child in children {
        let field = resolve(obj, child)?;

        tracing::trace!(
            model = obj.model_name(),
            field = %child.name,
            list = field.is_list(),
            nested = child.children.len(),
            "resolving field"
        );

        let contribution = match field {
            Field::List(list) => {
                let previous = list.subscription_config();
                list.set_subscription_config(&child.children)?;
                let stream = list.changes();
                configured.push((list, previous));
                stream
            }
            Field::Object(value) if !child.is_leaf() => {
                compose_fields(value.as_ref(), &child.children, configured)?
            }
            Field::Object(value) => value.changes(),
        };
        contributions.push(contribution.with_prefix(child.name.clone()));
    }

    Ok(ChangeStream::merge(contributions))
}
