//! # FlexCRM Plugin System Errors
//!
//! Defines error types specific to the plugin system.
//!
//! [`PluginSystemError`] is the umbrella returned by the lifecycle manager.
//! The narrower types map onto the failure classes of each component:
//! [`ManifestError`] (a plugin directory is skipped, discovery continues),
//! [`LoadError`] (an enable aborts, enablement unchanged) and
//! [`PersistenceError`] (logged; in-memory state still updates).
use std::path::PathBuf;

use crate::storage::error::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("Plugin directory '{0}' has no manifest")]
    MissingManifest(PathBuf),

    #[error("Plugin directory '{dir}' has no entry unit '{entry}'")]
    MissingEntryUnit { dir: PathBuf, entry: PathBuf },

    #[error("Failed to read manifest '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse manifest '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid manifest '{path}': {message}")]
    Invalid { path: PathBuf, message: String },
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Failed to read entry unit '{path}' of plugin '{plugin_id}': {source}")]
    EntryUnit {
        plugin_id: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to load library '{path}' of plugin '{plugin_id}': {source}")]
    Library {
        plugin_id: String,
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    #[error("Plugin '{plugin_id}' does not provide the entry symbol '{symbol}'")]
    MissingEntrySymbol { plugin_id: String, symbol: String },

    #[error("Plugin '{plugin_id}' panicked during '{operation}': {message}")]
    Panicked {
        plugin_id: String,
        operation: String,
        message: String,
    },

    #[error("Entry unit '{path}' of plugin '{plugin_id}' cannot be loaded in {mode} mode")]
    UnsupportedEntryUnit {
        plugin_id: String,
        path: PathBuf,
        mode: String,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("I/O error during operation '{operation}' on path '{path}': {source}")]
    Io {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize enablement state: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl PersistenceError {
    pub fn io(source: std::io::Error, operation: impl Into<String>, path: PathBuf) -> Self {
        PersistenceError::Io {
            source,
            operation: operation.into(),
            path,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PluginSystemError {
    #[error("Unknown plugin id '{0}'")]
    UnknownPlugin(String),

    #[error("Plugin '{0}' is not enabled")]
    NotEnabled(String),

    #[error("Plugin discovery failed for '{root}': {source}")]
    Discovery {
        root: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("Storage initialization failed for plugin '{plugin_id}': {source}")]
    Initialization {
        plugin_id: String,
        #[source]
        source: StoreError,
    },

    #[error("Plugin '{plugin_id}' panicked during storage initialization: {message}")]
    InitializationPanicked { plugin_id: String, message: String },
}

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic reason".to_string()
    }
}
