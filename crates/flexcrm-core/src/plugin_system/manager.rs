use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;

use crate::plugin_system::enablement::EnablementState;
use crate::plugin_system::error::{PluginSystemError, panic_message};
use crate::plugin_system::loader::{LoadedPlugin, PluginLoader};
use crate::plugin_system::manifest::PluginDescriptor;
use crate::plugin_system::registry::{DiscoveryReport, PluginRegistry};
use crate::storage::store::Store;

/// Lifecycle state of one plugin id in the current process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginState {
    /// Discovered and persisted disabled
    Disabled,
    /// Discovered, persisted enabled, no live instance yet
    EnabledUnloaded,
    /// Live instance registered
    Loaded,
    /// Not in the registry
    Undiscovered,
}

/// An enabled descriptor together with its live instance, if any
#[derive(Debug, Clone)]
pub struct EnabledPlugin<'a> {
    pub descriptor: &'a PluginDescriptor,
    pub instance: Option<Arc<LoadedPlugin>>,
}

/// Enable/disable state machine over discovered plugins.
///
/// Enablement is written through to disk on every change. Instances live
/// only while enabled in this process; ids persisted as enabled are loaded
/// lazily through [`activate`](Self::activate) or explicitly through
/// [`load_enabled`](Self::load_enabled).
pub struct PluginManager {
    registry: PluginRegistry,
    loader: Box<dyn PluginLoader>,
    enablement: EnablementState,
    loaded: HashMap<String, Arc<LoadedPlugin>>,
    store: Arc<Store>,
}

impl PluginManager {
    /// Create a manager over `plugins_dir`, reading persisted enablement
    /// from `enablement_file`. Nothing is scanned or loaded yet.
    pub fn new<P, Q>(
        plugins_dir: P,
        enablement_file: Q,
        loader: Box<dyn PluginLoader>,
        store: Arc<Store>,
    ) -> Self
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        Self {
            registry: PluginRegistry::new(plugins_dir),
            loader,
            enablement: EnablementState::load(enablement_file),
            loaded: HashMap::new(),
            store,
        }
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    pub fn enablement(&self) -> &EnablementState {
        &self.enablement
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Rescan the plugin directory. Live instances are left alone.
    pub fn discover(&mut self) -> Result<DiscoveryReport, PluginSystemError> {
        self.registry.discover()
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &PluginDescriptor> {
        self.registry.descriptors()
    }

    pub fn descriptor(&self, id: &str) -> Option<&PluginDescriptor> {
        self.registry.get(id)
    }

    /// Persisted enablement, regardless of discovery or load state
    pub fn is_enabled(&self, id: &str) -> bool {
        self.enablement.is_enabled(id)
    }

    pub fn is_loaded(&self, id: &str) -> bool {
        self.loaded.contains_key(id)
    }

    pub fn state(&self, id: &str) -> PluginState {
        if self.loaded.contains_key(id) {
            PluginState::Loaded
        } else if !self.registry.contains(id) {
            PluginState::Undiscovered
        } else if self.enablement.is_enabled(id) {
            PluginState::EnabledUnloaded
        } else {
            PluginState::Disabled
        }
    }

    /// Live instance for `id`, if one is registered
    pub fn instance(&self, id: &str) -> Option<Arc<LoadedPlugin>> {
        self.loaded.get(id).cloned()
    }

    /// Load, instantiate and initialize `id`, then mark it enabled.
    ///
    /// `id` must be in the current scan. Any failure leaves enablement
    /// untouched. An already loaded plugin is returned as is.
    pub fn enable(&mut self, id: &str) -> Result<Arc<LoadedPlugin>, PluginSystemError> {
        if self.registry.get(id).is_none() {
            let err = PluginSystemError::UnknownPlugin(id.to_string());
            log::error!("Failed to enable plugin '{}': {}", id, err);
            return Err(err);
        }
        if let Some(existing) = self.loaded.get(id).cloned() {
            log::debug!("Plugin '{}' is already loaded", id);
            self.record_enablement(id, true);
            return Ok(existing);
        }

        let loaded = match self.load_instance(id) {
            Ok(loaded) => loaded,
            Err(e) => {
                log::error!("Failed to enable plugin '{}': {}", id, e);
                return Err(e);
            }
        };

        let loaded = Arc::new(loaded);
        self.loaded.insert(id.to_string(), Arc::clone(&loaded));
        self.record_enablement(id, true);
        log::info!("Enabled plugin '{}'", id);
        Ok(loaded)
    }

    fn load_instance(&self, id: &str) -> Result<LoadedPlugin, PluginSystemError> {
        let descriptor = self
            .registry
            .get(id)
            .ok_or_else(|| PluginSystemError::UnknownPlugin(id.to_string()))?;

        let namespace = self.loader.load(descriptor)?;
        let loaded = namespace.instantiate()?;

        let store = self.store.as_ref();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| loaded.initialize_storage(store)));
        match outcome {
            Ok(Ok(())) => Ok(loaded),
            Ok(Err(source)) => Err(PluginSystemError::Initialization {
                plugin_id: id.to_string(),
                source,
            }),
            Err(payload) => Err(PluginSystemError::InitializationPanicked {
                plugin_id: id.to_string(),
                message: panic_message(payload.as_ref()),
            }),
        }
    }

    /// Drop the live instance, if any, and mark `id` disabled.
    pub fn disable(&mut self, id: &str) -> Result<(), PluginSystemError> {
        match self.loaded.remove(id) {
            Some(_) => log::info!("Disabled plugin '{}'", id),
            None => log::debug!("Plugin '{}' has no live instance to disable", id),
        }
        self.record_enablement(id, false);
        Ok(())
    }

    /// Disable then enable `id`. If the enable fails the plugin stays disabled.
    pub fn reload(&mut self, id: &str) -> Result<Arc<LoadedPlugin>, PluginSystemError> {
        self.disable(id)?;
        self.enable(id)
    }

    /// The lazy path: the live instance, loading it first when `id` is
    /// persisted enabled.
    pub fn activate(&mut self, id: &str) -> Result<Arc<LoadedPlugin>, PluginSystemError> {
        if let Some(existing) = self.instance(id) {
            return Ok(existing);
        }
        if !self.enablement.is_enabled(id) {
            return Err(PluginSystemError::NotEnabled(id.to_string()));
        }
        self.enable(id)
    }

    /// Enable every discovered, persisted-enabled plugin without a live
    /// instance. Failures are collected per id and do not stop the others.
    pub fn load_enabled(&mut self) -> Vec<(String, Result<Arc<LoadedPlugin>, PluginSystemError>)> {
        let pending: Vec<String> = self
            .registry
            .ids()
            .into_iter()
            .filter(|id| self.enablement.is_enabled(id) && !self.loaded.contains_key(id))
            .collect();

        pending
            .into_iter()
            .map(|id| {
                let result = self.enable(&id);
                (id, result)
            })
            .collect()
    }

    /// Discovered descriptors that are persisted enabled, by id
    pub fn enabled_plugins(&self) -> Vec<EnabledPlugin<'_>> {
        self.registry
            .descriptors()
            .filter(|descriptor| self.enablement.is_enabled(&descriptor.id))
            .map(|descriptor| EnabledPlugin {
                descriptor,
                instance: self.loaded.get(&descriptor.id).cloned(),
            })
            .collect()
    }

    // Persistence failures are logged; the in-memory value still changes.
    fn record_enablement(&mut self, id: &str, enabled: bool) {
        let changed = self.enablement.set(id, enabled);
        if !changed && self.enablement.path().exists() {
            return;
        }
        if let Err(e) = self.enablement.persist() {
            log::error!(
                "Failed to persist enablement of plugin '{}' to {}: {}",
                id,
                self.enablement.path().display(),
                e
            );
        }
    }
}

impl std::fmt::Debug for PluginManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut loaded: Vec<&String> = self.loaded.keys().collect();
        loaded.sort();
        f.debug_struct("PluginManager")
            .field("registry", &self.registry)
            .field("enablement", &self.enablement)
            .field("loaded", &loaded)
            .finish_non_exhaustive()
    }
}
