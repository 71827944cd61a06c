use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::plugin_system::error::{ManifestError, PluginSystemError};
use crate::plugin_system::manifest::{MANIFEST_FILE, PluginDescriptor};

/// A plugin directory that was passed over during a scan
#[derive(Debug)]
pub struct SkippedPlugin {
    pub directory: PathBuf,
    pub error: ManifestError,
}

/// Outcome of one discovery scan
#[derive(Debug, Default)]
pub struct DiscoveryReport {
    /// Ids registered by this scan, in scan order
    pub discovered: Vec<String>,
    pub skipped: Vec<SkippedPlugin>,
}

/// Filesystem-backed registry of plugin descriptors.
///
/// Each scan replaces the whole registry; nothing from an earlier scan
/// survives a rescan unless it is found again.
#[derive(Debug, Clone)]
pub struct PluginRegistry {
    root: PathBuf,
    descriptors: BTreeMap<String, PluginDescriptor>,
}

impl PluginRegistry {
    /// Create an empty registry scanning `root`
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            descriptors: BTreeMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Rescan the root directory and replace the registry with the result.
    ///
    /// Only immediate subdirectories are considered, in name order. A
    /// directory missing its manifest or entry unit, or with a bad manifest,
    /// is logged and skipped. A missing root yields an empty registry, and an
    /// unreadable one empties it before the error is returned.
    pub fn discover(&mut self) -> Result<DiscoveryReport, PluginSystemError> {
        let mut report = DiscoveryReport::default();
        let mut found = BTreeMap::new();

        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::info!("Plugin directory {} does not exist", self.root.display());
                self.descriptors = found;
                return Ok(report);
            }
            Err(source) => {
                // A failed scan leaves nothing discovered
                self.descriptors.clear();
                return Err(PluginSystemError::Discovery {
                    root: self.root.clone(),
                    source,
                });
            }
        };

        let mut dirs: Vec<PathBuf> = entries
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry.path()),
                Err(e) => {
                    log::warn!("Failed to read an entry of {}: {}", self.root.display(), e);
                    None
                }
            })
            .filter(|path| path.is_dir())
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .map_or(false, |name| !name.starts_with('.') && !name.starts_with("__"))
            })
            .collect();
        dirs.sort();

        for dir in dirs {
            match Self::scan_directory(&dir) {
                Ok(descriptor) => {
                    if let Some(existing) = found.get(&descriptor.id) {
                        let error = ManifestError::Invalid {
                            path: dir.join(MANIFEST_FILE),
                            message: format!(
                                "plugin id '{}' is already declared by {}",
                                descriptor.id,
                                existing.directory.display()
                            ),
                        };
                        log::warn!("Skipping plugin directory {}: {}", dir.display(), error);
                        report.skipped.push(SkippedPlugin { directory: dir, error });
                        continue;
                    }
                    log::debug!("Discovered plugin '{}' in {}", descriptor.id, dir.display());
                    report.discovered.push(descriptor.id.clone());
                    found.insert(descriptor.id.clone(), descriptor);
                }
                Err(error) => {
                    log::warn!("Skipping plugin directory {}: {}", dir.display(), error);
                    report.skipped.push(SkippedPlugin { directory: dir, error });
                }
            }
        }

        log::info!(
            "Discovered {} plugin(s) in {} ({} skipped)",
            found.len(),
            self.root.display(),
            report.skipped.len()
        );
        self.descriptors = found;
        Ok(report)
    }

    fn scan_directory(dir: &Path) -> Result<PluginDescriptor, ManifestError> {
        if !dir.join(MANIFEST_FILE).is_file() {
            return Err(ManifestError::MissingManifest(dir.to_path_buf()));
        }
        let descriptor = PluginDescriptor::from_manifest_file(dir)?;
        if !descriptor.entry_path.is_file() {
            return Err(ManifestError::MissingEntryUnit {
                dir: dir.to_path_buf(),
                entry: descriptor.entry_path,
            });
        }
        Ok(descriptor)
    }

    pub fn get(&self, id: &str) -> Option<&PluginDescriptor> {
        self.descriptors.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.descriptors.contains_key(id)
    }

    /// All descriptors, ordered by id
    pub fn descriptors(&self) -> impl Iterator<Item = &PluginDescriptor> {
        self.descriptors.values()
    }

    pub fn ids(&self) -> Vec<String> {
        self.descriptors.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
