use std::sync::Arc;

use crate::kernel::constants;
use crate::kernel::error::{Error, KernelLifecyclePhase, Result};
use crate::modules::clients::Client;
use crate::plugin_system::loader::{BuiltinLoader, DefaultPluginLoader, PluginLoader};
use crate::plugin_system::manager::PluginManager;
use crate::storage::config::AppConfig;
use crate::storage::entity::Entity;
use crate::storage::store::Store;

/// The process-wide singletons: one store and one plugin manager, built
/// once from configuration and handed out by reference.
#[derive(Debug)]
pub struct Application {
    config: AppConfig,
    store: Arc<Store>,
    plugin_manager: PluginManager,
}

impl Application {
    /// Open the database, create the built-in tables and set up the plugin
    /// manager with `loader`. Plugins are neither scanned nor loaded.
    pub fn bootstrap(config: AppConfig, loader: Box<dyn PluginLoader>) -> Result<Self> {
        log::info!("Initializing {} v{}", constants::APP_NAME, constants::APP_VERSION);

        let database_path = config.database_path();
        let store = Store::open(&database_path).map_err(|e| Error::KernelLifecycleError {
            phase: KernelLifecyclePhase::Bootstrap,
            message: format!("cannot open database {}", database_path.display()),
            source: Some(Box::new(e)),
        })?;
        let store = Arc::new(store);

        Client::create_table(&store)?;

        let plugin_manager = PluginManager::new(
            config.plugins_dir(),
            config.enablement_file(),
            loader,
            Arc::clone(&store),
        );

        Ok(Self {
            config,
            store,
            plugin_manager,
        })
    }

    /// Bootstrap with the standard loader for the configured mode, backed by
    /// the given compiled-in factories.
    pub fn with_builtins(config: AppConfig, builtins: BuiltinLoader) -> Result<Self> {
        let loader = DefaultPluginLoader::new(config.loader, builtins);
        Self::bootstrap(config, Box::new(loader))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub fn plugin_manager(&self) -> &PluginManager {
        &self.plugin_manager
    }

    pub fn plugin_manager_mut(&mut self) -> &mut PluginManager {
        &mut self.plugin_manager
    }

    /// Drop every live plugin instance and close the store.
    pub fn shutdown(self) -> Result<()> {
        let Self {
            store,
            plugin_manager,
            ..
        } = self;
        drop(plugin_manager);
        store.close().map_err(|e| Error::KernelLifecycleError {
            phase: KernelLifecyclePhase::Shutdown,
            message: "cannot close database".to_string(),
            source: Some(Box::new(e)),
        })?;
        log::info!("{} shut down", constants::APP_NAME);
        Ok(())
    }
}
