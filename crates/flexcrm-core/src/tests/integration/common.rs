#![cfg(test)]

use std::fs;
use std::path::Path;

use tempfile::{TempDir, tempdir};

use crate::kernel::bootstrap::Application;
use crate::plugin_system::loader::BuiltinLoader;
use crate::plugin_system::traits::{Plugin, PluginIdentity, UiView};
use crate::storage::config::AppConfig;
use crate::storage::entity::{Entity, RecordMeta};
use crate::storage::error::StoreResult;
use crate::storage::schema::{FieldSchema, FieldType};
use crate::storage::store::Store;
use crate::storage::value::{Record, RecordExt, Value};

// ===== MOCK PLUGINS =====

/// Minimal task entity owned by the mock tasks plugin
#[derive(Debug, Clone, PartialEq)]
pub struct TaskItem {
    meta: RecordMeta,
    pub title: String,
    pub status: String,
}

impl TaskItem {
    pub fn new(title: &str) -> Self {
        Self {
            meta: RecordMeta::new(),
            title: title.to_string(),
            status: "pending".to_string(),
        }
    }
}

impl Entity for TaskItem {
    const TABLE: &'static str = "tasks";

    fn fields() -> FieldSchema {
        FieldSchema::new()
            .field("title", FieldType::Text)
            .field("status", FieldType::Text)
    }

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn to_record(&self) -> Record {
        let mut record = Record::new();
        record.insert("title".into(), Value::from(self.title.clone()));
        record.insert("status".into(), Value::from(self.status.clone()));
        record
    }

    fn from_record(record: &Record) -> StoreResult<Self> {
        Ok(Self {
            meta: RecordMeta::new(),
            title: record.text("title")?,
            status: record.text("status")?,
        })
    }
}

pub struct MockTasksPlugin;

impl Plugin for MockTasksPlugin {
    fn identity(&self) -> PluginIdentity {
        PluginIdentity::new("Tasks", "✅")
    }

    fn initialize_storage(&self, store: &Store) -> StoreResult<()> {
        TaskItem::create_table(store)
    }

    fn render_ui(&self, store: &Store) -> StoreResult<UiView> {
        let view = UiView::new("Tasks", "✅").columns(["Title", "Status"]);
        Ok(TaskItem::get_all(store, None, &[])?
            .into_iter()
            .fold(view, |view, task| view.row([task.title, task.status])))
    }
}

pub fn mock_tasks_factory() -> Box<dyn Plugin> {
    Box::new(MockTasksPlugin)
}

// ===== SETUP HELPERS =====

/// Write the tasks manifest, as shipped by the tasks plugin, into
/// `plugins_dir/<dir_name>`
pub fn write_tasks_plugin(plugins_dir: &Path, dir_name: &str) {
    let dir = plugins_dir.join(dir_name);
    fs::create_dir_all(&dir).expect("Failed to create plugin dir");
    fs::write(
        dir.join("plugin.json"),
        r#"{"id": "tasks", "name": "Tasks", "version": "1.0"}"#,
    )
    .expect("Failed to write manifest");
    fs::write(dir.join("plugin.entry"), "tasks\n").expect("Failed to write entry unit");
}

/// A temp workspace with the tasks plugin on disk
pub fn setup_workspace() -> TempDir {
    let dir = tempdir().expect("Failed to create temp dir");
    write_tasks_plugin(&dir.path().join("plugins"), "tasks");
    dir
}

/// Bootstrap the application over `workspace` and run discovery
pub fn start_app(workspace: &Path) -> Application {
    let config = AppConfig::with_base_dir(workspace);
    let builtins = BuiltinLoader::new().with("tasks", mock_tasks_factory);
    let mut app = Application::with_builtins(config, builtins).expect("bootstrap failed");
    app.plugin_manager_mut().discover().expect("discovery failed");
    app
}
