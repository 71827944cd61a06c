//! # FlexCRM Plugin System
//!
//! Discovers self-contained plugin units on disk, loads them on demand and
//! tracks which ones are enabled across runs.
//!
//! ## Key Submodules and Responsibilities:
//!
//! - **[`manifest`]**: the `plugin.json` document and the resulting
//!   [`PluginDescriptor`].
//! - **[`registry`]**: filesystem discovery ([`PluginRegistry`]); every scan
//!   replaces the previous result.
//! - **[`loader`]**: turns an entry unit into a [`PluginNamespace`], either
//!   from compiled-in factories or from a shared library.
//! - **[`traits`]**: the [`Plugin`] capability set and the [`UiView`] it renders.
//! - **[`enablement`]**: the persisted id to enabled flag map.
//! - **[`manager`]**: the enable/disable state machine ([`PluginManager`]).
//! - **[`error`]**: error types for each stage, gathered under
//!   [`PluginSystemError`].
pub mod enablement;
pub mod error;
pub mod loader;
pub mod manager;
pub mod manifest;
pub mod registry;
pub mod traits;

pub use enablement::EnablementState;
pub use error::{LoadError, ManifestError, PersistenceError, PluginSystemError};
pub use loader::{
    BuiltinLoader, DefaultPluginLoader, DynamicLibraryLoader, LoadedPlugin, LoaderMode,
    PluginFactory, PluginLoader, PluginNamespace,
};
pub use manager::{EnabledPlugin, PluginManager, PluginState};
pub use manifest::PluginDescriptor;
pub use registry::{DiscoveryReport, PluginRegistry, SkippedPlugin};
pub use traits::{Plugin, PluginIdentity, UiView};

#[cfg(test)]
mod tests;
