use flexcrm_core::plugin_system::{Plugin, PluginIdentity, UiView};
use flexcrm_core::storage::{
    Entity, FieldSchema, FieldType, Record, RecordExt, RecordMeta, Store, StoreResult, Value,
};

/// Id under which this plugin is registered and discovered
pub const PLUGIN_ID: &str = "tasks";

pub const DEFAULT_PRIORITY: &str = "medium";
pub const DEFAULT_STATUS: &str = "pending";

/// A to-do item owned by the tasks plugin
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    meta: RecordMeta,
    pub title: String,
    pub description: Option<String>,
    pub priority: String,
    pub status: String,
}

impl Task {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            meta: RecordMeta::new(),
            title: title.into(),
            description: None,
            priority: DEFAULT_PRIORITY.to_string(),
            status: DEFAULT_STATUS.to_string(),
        }
    }

    pub fn with_priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = priority.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl Entity for Task {
    const TABLE: &'static str = "tasks";

    fn fields() -> FieldSchema {
        FieldSchema::new()
            .field("title", FieldType::Text)
            .field("description", FieldType::Text)
            .field("priority", FieldType::Text)
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
        record.insert("description".into(), Value::from(self.description.clone()));
        record.insert("priority".into(), Value::from(self.priority.clone()));
        record.insert("status".into(), Value::from(self.status.clone()));
        record
    }

    fn from_record(record: &Record) -> StoreResult<Self> {
        Ok(Self {
            meta: RecordMeta::new(),
            title: record.text("title")?,
            description: record.opt_text("description")?,
            priority: record
                .opt_text("priority")?
                .unwrap_or_else(|| DEFAULT_PRIORITY.to_string()),
            status: record
                .opt_text("status")?
                .unwrap_or_else(|| DEFAULT_STATUS.to_string()),
        })
    }
}

/// Task list with priority and status tracking.
#[derive(Debug, Default)]
pub struct TasksPlugin;

impl TasksPlugin {
    pub fn new() -> Self {
        Self
    }
}

impl Plugin for TasksPlugin {
    fn identity(&self) -> PluginIdentity {
        PluginIdentity::new("Tasks", "✅")
    }

    fn initialize_storage(&self, store: &Store) -> StoreResult<()> {
        Task::create_table(store)?;
        log::debug!("Tasks storage ready");
        Ok(())
    }

    fn render_ui(&self, store: &Store) -> StoreResult<UiView> {
        let identity = self.identity();
        let view = UiView::new(identity.name, identity.icon)
            .columns(["ID", "Title", "Priority", "Status"]);
        let tasks = Task::get_all(store, None, &[])?;
        Ok(tasks.into_iter().fold(view, |view, task| {
            let id = task.id().map(|id| id.to_string()).unwrap_or_default();
            view.row([id, task.title, task.priority, task.status])
        }))
    }
}

/// Compiled-in factory, registered with the host's builtin loader.
pub fn factory() -> Box<dyn Plugin> {
    Box::new(TasksPlugin::new())
}

flexcrm_core::declare_plugin!(TasksPlugin::new);
