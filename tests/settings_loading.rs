//! Integration tests for loading composer settings and named watches.

#![allow(unsafe_code)] // For env var manipulation in tests

use obsweave::core::ComposerSettings;
use obsweave::prelude::*;
use std::fs;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

fn profile() -> (Arc<ObservedRecord>, Arc<ObservedCell<String>>) {
    let city = Arc::new(ObservedCell::new("Bergen".to_string()));
    let address = ObservedRecord::builder("Address")
        .field("city", Arc::clone(&city))
        .build();
    let record = ObservedRecord::builder("Profile")
        .field("name", Arc::new(ObservedCell::new("Ada".to_string())))
        .field("address", address)
        .build();
    (record, city)
}

#[test]
fn test_load_yaml_watches() {
    let temp_dir = TempDir::new().unwrap();
    let settings_path = temp_dir.path().join("watches.yaml");

    fs::write(
        &settings_path,
        r#"
watches:
  location: |
    address
      city
  everything: ""
"#,
    )
    .unwrap();

    let settings = ComposerSettings::builder()
        .with_file(&settings_path)
        .build()
        .unwrap();
    assert_eq!(settings.watches.len(), 2);
    assert_eq!(settings.indent_unit, "  ");

    let (record, city) = profile();
    let stream = Composer::with_settings(settings)
        .watch(record.as_ref(), "location")
        .unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let _subscription = stream.subscribe(move |event| sink.lock().unwrap().push(event.path.clone()));

    city.set("Oslo".to_string()).unwrap();
    assert_eq!(*seen.lock().unwrap(), vec!["Profile.address.city"]);
}

#[test]
fn test_load_json_delimiters() {
    let temp_dir = TempDir::new().unwrap();
    let settings_path = temp_dir.path().join("settings.json");

    fs::write(
        &settings_path,
        r#"{
  "line_separator": ",",
  "indent_unit": ">",
  "watches": { "location": "address,>city" }
}"#,
    )
    .unwrap();

    let settings = ComposerSettings::builder()
        .with_file(&settings_path)
        .build()
        .unwrap();

    let tree = settings.watch_tree("location", "Profile").unwrap();
    assert_eq!(
        tree,
        ConfigNode::new("Profile")
            .with_child(ConfigNode::new("address").with_child(ConfigNode::new("city")))
    );
}

#[test]
fn test_later_file_overrides_earlier() {
    let temp_dir = TempDir::new().unwrap();
    let base_path = temp_dir.path().join("base.toml");
    let override_path = temp_dir.path().join("override.yaml");

    fs::write(&base_path, "indent_unit = \"    \"\nline_separator = \"|\"\n").unwrap();
    fs::write(&override_path, "indent_unit: \"-\"\n").unwrap();

    let settings = ComposerSettings::builder()
        .with_file(&base_path)
        .with_file(&override_path)
        .build()
        .unwrap();

    assert_eq!(settings.indent_unit, "-"); // Overridden
    assert_eq!(settings.line_separator, "|"); // From base
}

#[test]
fn test_invalid_settings_file() {
    let temp_dir = TempDir::new().unwrap();
    let settings_path = temp_dir.path().join("broken.yaml");
    fs::write(&settings_path, "watches: [unclosed").unwrap();

    let result = ComposerSettings::builder().with_file(&settings_path).build();
    assert!(matches!(result, Err(ObserveError::Settings(_))));
}

#[test]
fn test_env_overrides() {
    use std::env;

    let temp_dir = TempDir::new().unwrap();
    let settings_path = temp_dir.path().join("settings.yaml");
    fs::write(&settings_path, "indent_unit: \"  \"\n").unwrap();

    // Set environment variables
    unsafe {
        env::set_var("OBSWEAVE_SETTINGS_LOADING_INDENT_UNIT", "+");
        env::set_var("OBSWEAVE_SETTINGS_LOADING_WATCHES__NAMES", "name");
    }

    let settings = ComposerSettings::builder()
        .with_file(&settings_path)
        .with_env_overrides("OBSWEAVE_SETTINGS_LOADING", "__")
        .build()
        .unwrap();

    // Clean up
    unsafe {
        env::remove_var("OBSWEAVE_SETTINGS_LOADING_INDENT_UNIT");
        env::remove_var("OBSWEAVE_SETTINGS_LOADING_WATCHES__NAMES");
    }

    assert_eq!(settings.indent_unit, "+"); // From env
    assert_eq!(settings.watches.get("names").map(String::as_str), Some("name"));
}
