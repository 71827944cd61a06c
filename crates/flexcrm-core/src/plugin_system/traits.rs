use std::fmt;

use crate::storage::error::StoreResult;
use crate::storage::store::Store;

/// Icon shown for plugins that do not declare one
pub const DEFAULT_PLUGIN_ICON: &str = "🔌";

/// How a plugin presents itself to the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginIdentity {
    /// Display name used in navigation
    pub name: String,
    /// Icon shown next to the name
    pub icon: String,
}

impl PluginIdentity {
    pub fn new(name: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            icon: icon.into(),
        }
    }
}

/// Declarative view produced by a plugin's `render_ui`.
///
/// The shell decides how to draw it; the core only carries the data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiView {
    pub title: String,
    pub icon: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl UiView {
    pub fn new(title: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            icon: icon.into(),
            ..Self::default()
        }
    }

    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn row<I, S>(mut self, cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
        self
    }
}

impl fmt::Display for UiView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {}", self.icon, self.title)?;
        if !self.columns.is_empty() {
            writeln!(f, "{}", self.columns.join(" | "))?;
        }
        if self.rows.is_empty() {
            writeln!(f, "(empty)")?;
        }
        for row in &self.rows {
            writeln!(f, "{}", row.join(" | "))?;
        }
        Ok(())
    }
}

/// The capability set every loaded plugin must implement.
pub trait Plugin: Send + Sync {
    /// Name and icon of the plugin
    fn identity(&self) -> PluginIdentity;

    /// Create the tables this plugin persists to. Called once per enable,
    /// before the plugin is registered.
    fn initialize_storage(&self, store: &Store) -> StoreResult<()>;

    /// Describe the plugin's view for the shell.
    fn render_ui(&self, store: &Store) -> StoreResult<UiView>;

    /// Name shown in the sidebar
    fn module_name(&self) -> String {
        self.identity().name
    }

    /// Icon shown in the sidebar
    fn sidebar_icon(&self) -> String {
        self.identity().icon
    }
}
