use std::path::Path;

use tempfile::tempdir;

use crate::plugin_system::error::ManifestError;
use crate::plugin_system::manifest::{DEFAULT_ENTRY_UNIT, PluginDescriptor};
use crate::plugin_system::tests::write_plugin_with_manifest;
use crate::plugin_system::traits::DEFAULT_PLUGIN_ICON;

fn parse(content: &str) -> Result<PluginDescriptor, ManifestError> {
    let dir = Path::new("/plugins/sample");
    PluginDescriptor::from_manifest_str(content, dir, &dir.join("plugin.json"))
}

#[test]
fn test_required_fields_only() {
    let descriptor = parse(r#"{"id": "tasks", "name": "Tasks", "version": "1.0"}"#).unwrap();
    assert_eq!(descriptor.id, "tasks");
    assert_eq!(descriptor.name, "Tasks");
    assert_eq!(descriptor.version, "1.0");
    assert!(descriptor.icon.is_none());
    assert!(descriptor.author.is_none());
    assert_eq!(descriptor.display_icon(), DEFAULT_PLUGIN_ICON);
    assert_eq!(descriptor.directory, Path::new("/plugins/sample"));
    assert_eq!(descriptor.entry_path, Path::new("/plugins/sample").join(DEFAULT_ENTRY_UNIT));
}

#[test]
fn test_optional_fields() {
    let descriptor = parse(
        r#"{
            "id": "tasks",
            "name": "Tasks",
            "version": "1.0",
            "icon": "✅",
            "author": "FlexCRM Developers",
            "description": "Task list",
            "entry": "lib/libtasks.so"
        }"#,
    )
    .unwrap();
    assert_eq!(descriptor.display_icon(), "✅");
    assert_eq!(descriptor.author.as_deref(), Some("FlexCRM Developers"));
    assert_eq!(descriptor.description.as_deref(), Some("Task list"));
    assert_eq!(descriptor.entry_path, Path::new("/plugins/sample/lib/libtasks.so"));
}

#[test]
fn test_unknown_keys_are_ignored() {
    let manifest = r#"{"id": "x", "name": "X", "version": "0.1", "homepage": "https://x.test"}"#;
    let descriptor = parse(manifest).unwrap();
    assert_eq!(descriptor.id, "x");
}

#[test]
fn test_missing_required_key_is_parse_error() {
    let err = parse(r#"{"id": "tasks", "name": "Tasks"}"#).unwrap_err();
    assert!(matches!(err, ManifestError::Parse { .. }));
}

#[test]
fn test_malformed_json_is_parse_error() {
    let err = parse("{ id: tasks").unwrap_err();
    assert!(matches!(err, ManifestError::Parse { .. }));
}

#[test]
fn test_blank_or_spaced_id_is_invalid() {
    for id in ["", "   ", "my tasks"] {
        let manifest = format!(r#"{{"id": "{}", "name": "N", "version": "1"}}"#, id);
        let err = parse(&manifest).unwrap_err();
        assert!(matches!(err, ManifestError::Invalid { .. }), "id {:?} should be invalid", id);
    }
}

#[test]
fn test_blank_name_or_version_is_invalid() {
    assert!(matches!(
        parse(r#"{"id": "a", "name": " ", "version": "1"}"#),
        Err(ManifestError::Invalid { .. })
    ));
    assert!(matches!(
        parse(r#"{"id": "a", "name": "A", "version": ""}"#),
        Err(ManifestError::Invalid { .. })
    ));
}

#[test]
fn test_entry_must_stay_inside_plugin_dir() {
    for entry in ["../escape.entry", "/etc/passwd", "nested/../../up", ""] {
        let manifest = format!(
            r#"{{"id": "a", "name": "A", "version": "1", "entry": "{}"}}"#,
            entry
        );
        let err = parse(&manifest).unwrap_err();
        assert!(
            matches!(err, ManifestError::Invalid { .. }),
            "entry {:?} should be rejected",
            entry
        );
    }
}

#[test]
fn test_from_manifest_file_reads_disk() {
    let root = tempdir().expect("Failed to create temp dir");
    let dir = write_plugin_with_manifest(
        root.path(),
        "notes",
        r#"{"id": "notes", "name": "Notes", "version": "2.0"}"#,
        Some(""),
    );

    let descriptor = PluginDescriptor::from_manifest_file(&dir).unwrap();
    assert_eq!(descriptor.id, "notes");
    assert_eq!(descriptor.directory, dir);
}

#[test]
fn test_from_manifest_file_missing_is_io_error() {
    let root = tempdir().expect("Failed to create temp dir");
    let err = PluginDescriptor::from_manifest_file(root.path()).unwrap_err();
    assert!(matches!(err, ManifestError::Io { .. }));
}
