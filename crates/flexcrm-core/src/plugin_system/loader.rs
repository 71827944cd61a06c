use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::ops::Deref;
use std::panic;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use libloading::{Library, Symbol};
use serde::{Deserialize, Serialize};

use crate::plugin_system::error::{LoadError, panic_message};
use crate::plugin_system::manifest::PluginDescriptor;
use crate::plugin_system::traits::Plugin;

/// Symbol every dynamically loaded plugin library must export.
/// Use [`declare_plugin!`](crate::declare_plugin) to define it.
pub const ENTRY_SYMBOL: &str = "flexcrm_plugin_create";

/// Constructor of a compiled-in plugin
pub type PluginFactory = fn() -> Box<dyn Plugin>;

/// Signature of [`ENTRY_SYMBOL`]. Uses the Rust ABI, so the library must be
/// built with the same toolchain as the host.
pub type PluginCreateFn = unsafe extern "Rust" fn() -> Box<dyn Plugin>;

/// Which loading mechanism entry units go through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoaderMode {
    /// Compiled-in factories only; entry units name a factory key
    Builtin,
    /// Shared libraries only
    Dynamic,
    /// Shared libraries go to the dynamic loader, anything else is built-in
    #[default]
    Auto,
}

impl fmt::Display for LoaderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoaderMode::Builtin => write!(f, "builtin"),
            LoaderMode::Dynamic => write!(f, "dynamic"),
            LoaderMode::Auto => write!(f, "auto"),
        }
    }
}

impl FromStr for LoaderMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "builtin" => Ok(LoaderMode::Builtin),
            "dynamic" => Ok(LoaderMode::Dynamic),
            "auto" => Ok(LoaderMode::Auto),
            other => Err(format!("unknown loader mode '{}'", other)),
        }
    }
}

/// True when `path` carries the platform's shared library extension
pub fn is_shared_library(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case(std::env::consts::DLL_EXTENSION))
}

enum EntryPoint {
    Builtin { key: String, factory: PluginFactory },
    Dynamic { create: PluginCreateFn, library: Arc<Library> },
}

/// The loaded form of one plugin's entry unit, scoped to its plugin id.
///
/// Every call to [`instantiate`](PluginNamespace::instantiate) builds a new
/// instance; loading the same id twice gives two unrelated namespaces.
pub struct PluginNamespace {
    plugin_id: String,
    entry: EntryPoint,
}

impl PluginNamespace {
    /// Namespace backed by a compiled-in factory
    pub fn builtin(
        plugin_id: impl Into<String>,
        key: impl Into<String>,
        factory: PluginFactory,
    ) -> Self {
        Self {
            plugin_id: plugin_id.into(),
            entry: EntryPoint::Builtin {
                key: key.into(),
                factory,
            },
        }
    }

    pub fn plugin_id(&self) -> &str {
        &self.plugin_id
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self.entry, EntryPoint::Dynamic { .. })
    }

    /// Construct a fresh instance from the entry symbol. Panics in plugin
    /// code are caught and reported as [`LoadError::Panicked`].
    pub fn instantiate(&self) -> Result<LoadedPlugin, LoadError> {
        let (instance, library) = match &self.entry {
            EntryPoint::Builtin { factory, .. } => {
                let factory = *factory;
                let instance = panic::catch_unwind(factory).map_err(|payload| LoadError::Panicked {
                    plugin_id: self.plugin_id.clone(),
                    operation: "instantiate".to_string(),
                    message: panic_message(payload.as_ref()),
                })?;
                (instance, None)
            }
            EntryPoint::Dynamic { create, library } => {
                let create = *create;
                // SAFETY: `create` was resolved from `library`, which stays
                // alive for as long as the returned instance.
                let result = panic::catch_unwind(|| unsafe { create() });
                let instance = result.map_err(|payload| LoadError::Panicked {
                    plugin_id: self.plugin_id.clone(),
                    operation: ENTRY_SYMBOL.to_string(),
                    message: panic_message(payload.as_ref()),
                })?;
                (instance, Some(Arc::clone(library)))
            }
        };
        Ok(LoadedPlugin {
            plugin_id: self.plugin_id.clone(),
            instance,
            _library: library,
        })
    }
}

impl fmt::Debug for PluginNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.entry {
            EntryPoint::Builtin { key, .. } => format!("builtin:{}", key),
            EntryPoint::Dynamic { .. } => "dynamic".to_string(),
        };
        f.debug_struct("PluginNamespace")
            .field("plugin_id", &self.plugin_id)
            .field("entry", &kind)
            .finish()
    }
}

/// A live plugin instance bound to one descriptor id.
pub struct LoadedPlugin {
    plugin_id: String,
    // Declared before the library so it is dropped first.
    instance: Box<dyn Plugin>,
    _library: Option<Arc<Library>>,
}

impl LoadedPlugin {
    pub fn plugin_id(&self) -> &str {
        &self.plugin_id
    }
}

impl Deref for LoadedPlugin {
    type Target = dyn Plugin;

    fn deref(&self) -> &Self::Target {
        self.instance.as_ref()
    }
}

impl fmt::Debug for LoadedPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedPlugin")
            .field("plugin_id", &self.plugin_id)
            .field("dynamic", &self._library.is_some())
            .finish_non_exhaustive()
    }
}

/// Turns a descriptor's entry unit into a [`PluginNamespace`].
pub trait PluginLoader {
    fn load(&self, descriptor: &PluginDescriptor) -> Result<PluginNamespace, LoadError>;
}

/// Compiled-in plugin registry.
///
/// The entry unit is a small text file whose first non-empty,
/// non-comment line names the factory key; an empty file means "use the
/// plugin id". Nothing is executed from disk.
#[derive(Clone, Default)]
pub struct BuiltinLoader {
    factories: BTreeMap<String, PluginFactory>,
}

impl BuiltinLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under `key`, replacing any earlier one
    pub fn register(&mut self, key: impl Into<String>, factory: PluginFactory) -> &mut Self {
        self.factories.insert(key.into(), factory);
        self
    }

    pub fn with(mut self, key: impl Into<String>, factory: PluginFactory) -> Self {
        self.register(key, factory);
        self
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    fn entry_key(descriptor: &PluginDescriptor) -> Result<String, LoadError> {
        let content =
            fs::read_to_string(&descriptor.entry_path).map_err(|source| LoadError::EntryUnit {
                plugin_id: descriptor.id.clone(),
                path: descriptor.entry_path.clone(),
                source,
            })?;
        let key = content
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty() && !line.starts_with('#'))
            .unwrap_or(descriptor.id.as_str());
        Ok(key.to_string())
    }
}

impl PluginLoader for BuiltinLoader {
    fn load(&self, descriptor: &PluginDescriptor) -> Result<PluginNamespace, LoadError> {
        let key = Self::entry_key(descriptor)?;
        let factory = self
            .factories
            .get(&key)
            .copied()
            .ok_or_else(|| LoadError::MissingEntrySymbol {
                plugin_id: descriptor.id.clone(),
                symbol: key.clone(),
            })?;
        Ok(PluginNamespace::builtin(descriptor.id.clone(), key, factory))
    }
}

impl fmt::Debug for BuiltinLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuiltinLoader")
            .field("factories", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Loads shared libraries exporting [`ENTRY_SYMBOL`].
///
/// Each load opens its own library handle with local symbol visibility, so
/// identically named symbols in different plugins do not interfere.
#[derive(Debug, Clone, Copy, Default)]
pub struct DynamicLibraryLoader;

impl DynamicLibraryLoader {
    /// Open the descriptor's library and resolve `symbol` as its entry point.
    pub(crate) fn load_entry(
        &self,
        descriptor: &PluginDescriptor,
        symbol: &str,
    ) -> Result<PluginNamespace, LoadError> {
        let path = &descriptor.entry_path;
        // SAFETY: loading a library runs its initializers; plugin libraries
        // are trusted code placed in the plugin directory by the operator.
        let library = unsafe { Library::new(path) }.map_err(|source| LoadError::Library {
            plugin_id: descriptor.id.clone(),
            path: path.clone(),
            source,
        })?;

        let create: PluginCreateFn = {
            // SAFETY: the symbol type matches what `declare_plugin!` emits.
            let entry: Symbol<PluginCreateFn> = unsafe { library.get(symbol.as_bytes()) }
                .map_err(|_| LoadError::MissingEntrySymbol {
                    plugin_id: descriptor.id.clone(),
                    symbol: symbol.to_string(),
                })?;
            *entry
        };

        log::debug!("Loaded library {} for plugin '{}'", path.display(), descriptor.id);
        Ok(PluginNamespace {
            plugin_id: descriptor.id.clone(),
            entry: EntryPoint::Dynamic {
                create,
                library: Arc::new(library),
            },
        })
    }
}

impl PluginLoader for DynamicLibraryLoader {
    fn load(&self, descriptor: &PluginDescriptor) -> Result<PluginNamespace, LoadError> {
        self.load_entry(descriptor, ENTRY_SYMBOL)
    }
}

/// The loader used by the application: dispatches on [`LoaderMode`].
#[derive(Debug, Clone, Default)]
pub struct DefaultPluginLoader {
    mode: LoaderMode,
    builtin: BuiltinLoader,
    dynamic: DynamicLibraryLoader,
}

impl DefaultPluginLoader {
    pub fn new(mode: LoaderMode, builtin: BuiltinLoader) -> Self {
        Self {
            mode,
            builtin,
            dynamic: DynamicLibraryLoader,
        }
    }

    pub fn mode(&self) -> LoaderMode {
        self.mode
    }
}

impl PluginLoader for DefaultPluginLoader {
    fn load(&self, descriptor: &PluginDescriptor) -> Result<PluginNamespace, LoadError> {
        let shared = is_shared_library(&descriptor.entry_path);
        match (self.mode, shared) {
            (LoaderMode::Dynamic, true) | (LoaderMode::Auto, true) => {
                self.dynamic.load(descriptor)
            }
            (LoaderMode::Builtin, false) | (LoaderMode::Auto, false) => {
                self.builtin.load(descriptor)
            }
            (mode, _) => Err(LoadError::UnsupportedEntryUnit {
                plugin_id: descriptor.id.clone(),
                path: descriptor.entry_path.clone(),
                mode: mode.to_string(),
            }),
        }
    }
}

/// Export a plugin type from a `cdylib` so the dynamic loader can find it.
///
/// ```ignore
/// flexcrm_core::declare_plugin!(TasksPlugin::new);
/// ```
#[macro_export]
macro_rules! declare_plugin {
    ($constructor:path) => {
        #[unsafe(no_mangle)]
        pub extern "Rust" fn flexcrm_plugin_create()
        -> ::std::boxed::Box<dyn $crate::plugin_system::Plugin> {
            ::std::boxed::Box::new($constructor())
        }
    };
}
