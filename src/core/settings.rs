//! Composer settings and their loading from files and environment variables.

use crate::error::{ObserveError, Result};
use crate::tree::{ConfigNode, ConfigTreeBuilder, DEFAULT_INDENT_UNIT, DEFAULT_LINE_SEPARATOR};
use config::{Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Settings shared by every composition made with a [`Composer`](crate::core::Composer).
///
/// All fields have defaults, so a settings file only needs the keys it
/// overrides:
///
/// ```yaml
/// indent_unit: "."
/// watches:
///   profile: |
///     name
///     address
///     .city
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposerSettings {
    /// Token separating lines of watch text
    pub line_separator: String,
    /// Token counted to compute a line's depth
    pub indent_unit: String,
    /// Named watch texts, usable with [`Composer::watch`](crate::core::Composer::watch)
    pub watches: BTreeMap<String, String>,
}

impl Default for ComposerSettings {
    fn default() -> Self {
        Self {
            line_separator: DEFAULT_LINE_SEPARATOR.to_string(),
            indent_unit: DEFAULT_INDENT_UNIT.to_string(),
            watches: BTreeMap::new(),
        }
    }
}

impl ComposerSettings {
    /// Create a new builder for loading settings.
    pub fn builder() -> ComposerSettingsBuilder {
        ComposerSettingsBuilder::new()
    }

    /// A tree builder using these delimiters.
    pub fn tree_builder(&self, root_name: impl Into<String>) -> ConfigTreeBuilder {
        ConfigTreeBuilder::new(root_name)
            .with_line_separator(self.line_separator.clone())
            .with_indent_unit(self.indent_unit.clone())
    }

    /// Parse the watch named `name` into a tree rooted at `root_name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the watch is unknown or its text cannot be parsed.
    pub fn watch_tree(&self, name: &str, root_name: &str) -> Result<ConfigNode> {
        let text = self
            .watches
            .get(name)
            .ok_or_else(|| ObserveError::UnknownWatch(name.to_string()))?;
        self.tree_builder(root_name).build(text)
    }
}

/// Builder loading [`ComposerSettings`] from layered sources.
///
/// Files are applied in the order they are added, later files overriding
/// earlier ones; environment variables override every file.
///
/// # Examples
///
/// ```rust,no_run
/// use obsweave::core::ComposerSettings;
///
/// # fn example() -> obsweave::error::Result<()> {
/// // OBSWEAVE_INDENT_UNIT overrides the files, OBSWEAVE_WATCHES__PROFILE adds a watch.
/// let settings = ComposerSettings::builder()
///     .with_file("config/watches.yaml")
///     .with_file("config/local.toml")
///     .with_env_overrides("OBSWEAVE", "__")
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ComposerSettingsBuilder {
    file_paths: Vec<PathBuf>,
    env_prefix: Option<String>,
    env_separator: Option<String>,
}

impl ComposerSettingsBuilder {
    /// Create a new builder with no sources.
    pub fn new() -> Self {
        Self {
            file_paths: Vec::new(),
            env_prefix: None,
            env_separator: None,
        }
    }

    /// Add a settings file.
    ///
    /// Supported formats: YAML (.yaml, .yml), TOML (.toml), JSON (.json)
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_paths.push(path.into());
        self
    }

    /// Add environment variable overrides.
    ///
    /// # Arguments
    ///
    /// * `prefix` - Prefix for environment variables (e.g., "OBSWEAVE")
    /// * `separator` - Separator for nested keys (e.g., "__" for OBSWEAVE_WATCHES__PROFILE)
    pub fn with_env_overrides(mut self, prefix: &str, separator: &str) -> Self {
        self.env_prefix = Some(prefix.to_string());
        self.env_separator = Some(separator.to_string());
        self
    }

    /// Load and merge all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A file has an unsupported extension or does not exist
    /// - A source cannot be parsed
    /// - The merged values do not form valid settings
    pub fn build(self) -> Result<ComposerSettings> {
        let mut builder = config::Config::builder();

        for path in &self.file_paths {
            validate_file(path)?;
            builder = builder.add_source(File::from(path.clone()).required(true));
        }

        if let (Some(prefix), Some(separator)) = (&self.env_prefix, &self.env_separator) {
            builder = builder.add_source(
                Environment::with_prefix(prefix)
                    .prefix_separator("_")
                    .separator(separator),
            );
        }

        let settings: ComposerSettings = builder.build()?.try_deserialize()?;
        tracing::debug!(
            files = self.file_paths.len(),
            watches = settings.watches.len(),
            "loaded composer settings"
        );
        Ok(settings)
    }
}

impl Default for ComposerSettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_file(path: &Path) -> Result<()> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .ok_or_else(|| {
            ObserveError::Settings(format!(
                "Unable to determine file format for: {}",
                path.display()
            ))
        })?;

    if !matches!(extension, "yaml" | "yml" | "toml" | "json") {
        return Err(ObserveError::Settings(format!(
            "Unsupported file extension: {}. Supported: .yaml, .yml, .toml, .json",
            extension
        )));
    }

    if !path.exists() {
        return Err(ObserveError::Settings(format!(
            "Settings file not found: {}",
            path.display()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_without_sources() {
        let settings = ComposerSettings::builder().build().unwrap();
        assert_eq!(settings, ComposerSettings::default());
        assert_eq!(settings.line_separator, "\n");
        assert_eq!(settings.indent_unit, "  ");
    }

    #[test]
    fn test_builder_accumulates_files() {
        let builder = ComposerSettingsBuilder::new()
            .with_file("one.yaml")
            .with_file("two.toml");
        assert_eq!(builder.file_paths.len(), 2);
    }

    #[test]
    fn test_builder_env_overrides() {
        let builder = ComposerSettingsBuilder::new().with_env_overrides("OBSWEAVE", "__");
        assert_eq!(builder.env_prefix, Some("OBSWEAVE".to_string()));
        assert_eq!(builder.env_separator, Some("__".to_string()));
    }

    #[test]
    fn test_unsupported_extension() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.txt");
        fs::write(&path, "indent_unit = ' '").unwrap();

        let err = ComposerSettings::builder().with_file(&path).build().unwrap_err();
        assert!(matches!(err, ObserveError::Settings(msg) if msg.contains("Unsupported")));
    }

    #[test]
    fn test_missing_file() {
        let err = ComposerSettings::builder()
            .with_file("/nonexistent/settings.yaml")
            .build()
            .unwrap_err();
        assert!(matches!(err, ObserveError::Settings(msg) if msg.contains("not found")));
    }

    #[test]
    fn test_load_toml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.toml");
        fs::write(
            &path,
            r#"
line_separator = ";"

[watches]
profile = "name;address;  city"
"#,
        )
        .unwrap();

        let settings = ComposerSettings::builder().with_file(&path).build().unwrap();
        assert_eq!(settings.line_separator, ";");
        assert_eq!(settings.indent_unit, "  ");

        let tree = settings.watch_tree("profile", "Profile").unwrap();
        assert_eq!(tree.name, "Profile");
        assert_eq!(tree.children.len(), 2);
        assert_eq!(tree.children[1].children[0].name, "city");
    }

    #[test]
    fn test_watch_tree_unknown() {
        let err = ComposerSettings::default()
            .watch_tree("nope", "Root")
            .unwrap_err();
        assert!(matches!(err, ObserveError::UnknownWatch(_)));
    }
}
