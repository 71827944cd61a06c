pub mod manifest_tests;

use std::fs;
use std::path::{Path, PathBuf};

use crate::plugin_system::traits::{Plugin, PluginIdentity, UiView};
use crate::storage::error::StoreResult;
use crate::storage::schema::{FieldSchema, FieldType};
use crate::storage::store::Store;

/// Create `root/<dir_name>` with a manifest for `id` and an entry unit
/// holding `entry`.
pub(crate) fn write_plugin(root: &Path, dir_name: &str, id: &str, entry: &str) -> PathBuf {
    let manifest = format!(r#"{{"id": "{}", "name": "{} plugin", "version": "1.0"}}"#, id, id);
    write_plugin_with_manifest(root, dir_name, &manifest, Some(entry))
}

pub(crate) fn write_plugin_with_manifest(
    root: &Path,
    dir_name: &str,
    manifest: &str,
    entry: Option<&str>,
) -> PathBuf {
    let dir = root.join(dir_name);
    fs::create_dir_all(&dir).expect("Failed to create plugin dir");
    fs::write(dir.join("plugin.json"), manifest).expect("Failed to write manifest");
    if let Some(entry) = entry {
        fs::write(dir.join("plugin.entry"), entry).expect("Failed to write entry unit");
    }
    dir
}

/// Creates a `notes` table and lists nothing
pub(crate) struct NotesPlugin;

impl Plugin for NotesPlugin {
    fn identity(&self) -> PluginIdentity {
        PluginIdentity::new("Notes", "📝")
    }

    fn initialize_storage(&self, store: &Store) -> StoreResult<()> {
        store
            .schema()
            .create_table("notes", &FieldSchema::new().field("body", FieldType::Text))
    }

    fn render_ui(&self, _store: &Store) -> StoreResult<UiView> {
        Ok(UiView::new("Notes", "📝").columns(["Body"]))
    }
}

pub(crate) fn notes_factory() -> Box<dyn Plugin> {
    Box::new(NotesPlugin)
}

/// Declares a reserved column, so storage initialization always fails
pub(crate) struct BrokenSchemaPlugin;

impl Plugin for BrokenSchemaPlugin {
    fn identity(&self) -> PluginIdentity {
        PluginIdentity::new("Broken", "💥")
    }

    fn initialize_storage(&self, store: &Store) -> StoreResult<()> {
        store
            .schema()
            .create_table("broken", &FieldSchema::new().field("id", FieldType::Integer))
    }

    fn render_ui(&self, _store: &Store) -> StoreResult<UiView> {
        Ok(UiView::new("Broken", "💥"))
    }
}

pub(crate) fn broken_schema_factory() -> Box<dyn Plugin> {
    Box::new(BrokenSchemaPlugin)
}

/// Panics inside its storage hook
pub(crate) struct PanickingPlugin;

impl Plugin for PanickingPlugin {
    fn identity(&self) -> PluginIdentity {
        PluginIdentity::new("Panicky", "🙃")
    }

    fn initialize_storage(&self, _store: &Store) -> StoreResult<()> {
        panic!("storage hook exploded");
    }

    fn render_ui(&self, _store: &Store) -> StoreResult<UiView> {
        Ok(UiView::new("Panicky", "🙃"))
    }
}

pub(crate) fn panicking_plugin_factory() -> Box<dyn Plugin> {
    Box::new(PanickingPlugin)
}

pub(crate) fn panicking_factory() -> Box<dyn Plugin> {
    panic!("constructor exploded");
}
