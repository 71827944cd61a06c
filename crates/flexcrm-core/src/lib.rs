pub mod kernel;
pub mod modules;
pub mod plugin_system;
pub mod storage;

// Re-export key public types/traits for the binary and plugins
pub use kernel::Application;
pub use kernel::error::Error as KernelError;
pub use plugin_system::{Plugin, PluginDescriptor, PluginIdentity, PluginManager, UiView};
pub use storage::{
    Entity, FieldSchema, FieldType, Record, RecordExt, RecordMeta, Store, StoreError, Value,
};

#[cfg(test)]
mod tests;
