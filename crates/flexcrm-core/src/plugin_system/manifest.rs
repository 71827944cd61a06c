use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::Deserialize;

use crate::plugin_system::error::ManifestError;
use crate::plugin_system::traits::DEFAULT_PLUGIN_ICON;

/// File name of the manifest inside a plugin directory
pub const MANIFEST_FILE: &str = "plugin.json";
/// Entry unit used when the manifest does not name one
pub const DEFAULT_ENTRY_UNIT: &str = "plugin.entry";

// --- Intermediate struct for deserialization ---

#[derive(Deserialize, Debug)]
struct RawPluginManifest {
    id: String,
    name: String,
    version: String,
    #[serde(default)]
    icon: Option<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    entry: Option<String>,
}

/// Discovered declarative description of a plugin unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginDescriptor {
    /// Unique identifier for the plugin
    pub id: String,
    /// Human-readable name
    pub name: String,
    pub version: String,
    pub icon: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    /// Directory the plugin was discovered in
    pub directory: PathBuf,
    /// Entry unit, resolved against `directory`
    pub entry_path: PathBuf,
}

impl PluginDescriptor {
    /// Icon to display, falling back to the generic plugin icon
    pub fn display_icon(&self) -> &str {
        self.icon.as_deref().unwrap_or(DEFAULT_PLUGIN_ICON)
    }

    /// Parse the manifest of `dir` into a descriptor.
    ///
    /// Does not check that the entry unit exists; the registry does.
    pub fn from_manifest_file(dir: &Path) -> Result<Self, ManifestError> {
        let manifest_path = dir.join(MANIFEST_FILE);
        let content = fs::read_to_string(&manifest_path).map_err(|source| ManifestError::Io {
            path: manifest_path.clone(),
            source,
        })?;
        Self::from_manifest_str(&content, dir, &manifest_path)
    }

    pub(crate) fn from_manifest_str(
        content: &str,
        dir: &Path,
        manifest_path: &Path,
    ) -> Result<Self, ManifestError> {
        let raw: RawPluginManifest =
            serde_json::from_str(content).map_err(|source| ManifestError::Parse {
                path: manifest_path.to_path_buf(),
                source,
            })?;

        let invalid = |message: String| ManifestError::Invalid {
            path: manifest_path.to_path_buf(),
            message,
        };

        let id = raw.id.trim();
        if id.is_empty() || id.chars().any(char::is_whitespace) {
            return Err(invalid(format!(
                "plugin id '{}' must be non-empty and contain no whitespace",
                raw.id
            )));
        }
        if raw.name.trim().is_empty() {
            return Err(invalid("plugin name must not be empty".to_string()));
        }
        if raw.version.trim().is_empty() {
            return Err(invalid("plugin version must not be empty".to_string()));
        }

        let entry = raw.entry.unwrap_or_else(|| DEFAULT_ENTRY_UNIT.to_string());
        let entry_rel = Path::new(&entry);
        let escapes = entry_rel
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)));
        if entry.is_empty() || entry_rel.is_absolute() || escapes {
            return Err(invalid(format!(
                "entry '{}' must be relative and not traverse upwards",
                entry
            )));
        }

        Ok(Self {
            id: id.to_string(),
            name: raw.name,
            version: raw.version,
            icon: raw.icon,
            author: raw.author,
            description: raw.description,
            directory: dir.to_path_buf(),
            entry_path: dir.join(entry_rel),
        })
    }
}
