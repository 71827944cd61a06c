use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::plugin_system::error::PersistenceError;

/// Durable map of plugin id to enabled flag, backed by a JSON file.
///
/// The map is independent of discovery: ids may be recorded for plugins
/// that are no longer present on disk.
#[derive(Debug, Clone)]
pub struct EnablementState {
    path: PathBuf,
    states: BTreeMap<String, bool>,
}

impl EnablementState {
    /// An empty state that will be written to `path`
    pub fn empty<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            states: BTreeMap::new(),
        }
    }

    /// Read the state file. A missing file means nothing is enabled; an
    /// unreadable or unparsable one is logged and treated the same way.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let mut state = Self::empty(path);
        match fs::read_to_string(&state.path) {
            Ok(content) => match serde_json::from_str::<BTreeMap<String, bool>>(&content) {
                Ok(states) => state.states = states,
                Err(e) => log::warn!(
                    "Ignoring unparsable enablement file {}: {}",
                    state.path.display(),
                    e
                ),
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("No enablement file at {}", state.path.display());
            }
            Err(e) => log::warn!(
                "Ignoring unreadable enablement file {}: {}",
                state.path.display(),
                e
            ),
        }
        state
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persisted flag for `id`; unknown ids are disabled
    pub fn is_enabled(&self, id: &str) -> bool {
        self.states.get(id).copied().unwrap_or(false)
    }

    /// Record `enabled` for `id` in memory. Returns whether the value changed.
    pub fn set(&mut self, id: &str, enabled: bool) -> bool {
        self.states.insert(id.to_string(), enabled) != Some(enabled)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, bool)> {
        self.states.iter().map(|(id, enabled)| (id.as_str(), *enabled))
    }

    /// Write the whole map atomically: a temporary file in the target
    /// directory is renamed over the old one.
    pub fn persist(&self) -> Result<(), PersistenceError> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)
            .map_err(|e| PersistenceError::io(e, "create_dir_all", parent.clone()))?;

        let json = serde_json::to_string_pretty(&self.states)?;
        let mut temp_file = NamedTempFile::new_in(&parent)
            .map_err(|e| PersistenceError::io(e, "create_temp_file", parent.clone()))?;
        let temp_path = temp_file.path().to_path_buf();
        temp_file
            .write_all(json.as_bytes())
            .map_err(|e| PersistenceError::io(e, "write_temp_file", temp_path))?;
        temp_file
            .persist(&self.path)
            .map_err(|e| PersistenceError::io(e.error, "persist_temp_file", self.path.clone()))?;

        log::debug!("Persisted enablement state to {}", self.path.display());
        Ok(())
    }
}
