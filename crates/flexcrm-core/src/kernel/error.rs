//! # FlexCRM Kernel Errors
//!
//! [`Error`] gathers the typed errors of every subsystem so the host can
//! propagate them with `?` and report them in one place.
use std::result::Result as StdResult;

use thiserror::Error as ThisError;

use crate::plugin_system::error::PluginSystemError;
use crate::storage::config::ConfigError;
use crate::storage::error::StoreError;

/// Phase of the application lifecycle an error occurred in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelLifecyclePhase {
    Bootstrap,
    Shutdown,
}

impl std::fmt::Display for KernelLifecyclePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KernelLifecyclePhase::Bootstrap => write!(f, "Bootstrap"),
            KernelLifecyclePhase::Shutdown => write!(f, "Shutdown"),
        }
    }
}

#[derive(Debug, ThisError)]
pub enum Error {
    /// Specific, typed plugin system error
    #[error("Plugin system error: {0}")]
    PluginSystem(#[from] PluginSystemError),

    /// Specific, typed store error
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Kernel {phase} failed: {message}")]
    KernelLifecycleError {
        phase: KernelLifecyclePhase,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// Result type alias for kernel operations
pub type Result<T> = StdResult<T, Error>;
