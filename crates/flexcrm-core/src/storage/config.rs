use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::plugin_system::loader::LoaderMode;

/// Default database location, relative to the configuration base directory
pub const DEFAULT_DATABASE_PATH: &str = "db/crm.db";
/// Default plugin root
pub const DEFAULT_PLUGINS_DIR: &str = "plugins";
/// Default enablement state file
pub const DEFAULT_ENABLEMENT_FILE: &str = "plugins/enabled_plugins.json";

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigFormat {
    /// JSON format (.json)
    Json,
    /// YAML format (.yaml, .yml) - requires "yaml-config" feature
    #[cfg(feature = "yaml-config")]
    Yaml,
    /// TOML format (.toml) - requires "toml-config" feature
    #[cfg(feature = "toml-config")]
    Toml,
}

impl ConfigFormat {
    /// Canonical file extension, also used to label parse errors
    pub fn extension(&self) -> &'static str {
        match self {
            ConfigFormat::Json => "json",
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => "yaml",
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => "toml",
        }
    }

    /// Determine format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| match ext.to_lowercase().as_str() {
                "json" => Some(ConfigFormat::Json),
                #[cfg(feature = "yaml-config")]
                "yaml" | "yml" => Some(ConfigFormat::Yaml),
                #[cfg(feature = "toml-config")]
                "toml" => Some(ConfigFormat::Toml),
                _ => None,
            })
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported configuration format: {0}")]
    UnsupportedFormat(PathBuf),

    #[error("Deserialization from '{format}' failed for '{path}': {source}")]
    Deserialization {
        format: &'static str,
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

/// Application configuration.
///
/// Every field has a default, so an empty document (or no file at all) is a
/// valid configuration. Relative paths are resolved against `base_dir`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub plugins_dir: PathBuf,
    pub enablement_file: PathBuf,
    pub loader: LoaderMode,
    pub log_level: String,
    /// Directory relative paths are resolved against; not read from files
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            plugins_dir: PathBuf::from(DEFAULT_PLUGINS_DIR),
            enablement_file: PathBuf::from(DEFAULT_ENABLEMENT_FILE),
            loader: LoaderMode::Auto,
            log_level: "info".to_string(),
            base_dir: PathBuf::from("."),
        }
    }
}

impl AppConfig {
    /// Defaults, with relative paths resolved against `base_dir`.
    pub fn with_base_dir<P: AsRef<Path>>(base_dir: P) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Load a configuration file; the format is taken from its extension.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)
            .ok_or_else(|| ConfigError::UnsupportedFormat(path.to_path_buf()))?;
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::parse(&content, format, path)?;
        config.base_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(config)
    }

    fn parse(content: &str, format: ConfigFormat, path: &Path) -> Result<Self, ConfigError> {
        let wrap = |source: Box<dyn std::error::Error + Send + Sync>| {
            ConfigError::Deserialization {
                format: format.extension(),
                path: path.to_path_buf(),
                source,
            }
        };
        match format {
            ConfigFormat::Json => serde_json::from_str(content).map_err(|e| wrap(Box::new(e))),
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => serde_yaml::from_str(content).map_err(|e| wrap(Box::new(e))),
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => toml::from_str(content).map_err(|e| wrap(Box::new(e))),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.resolve(&self.database_path)
    }

    pub fn plugins_dir(&self) -> PathBuf {
        self.resolve(&self.plugins_dir)
    }

    pub fn enablement_file(&self) -> PathBuf {
        self.resolve(&self.enablement_file)
    }
}
