//! # FlexCRM Kernel
//!
//! Wires the subsystems together.
//!
//! - **Application Bootstrapping**: [`Application`](bootstrap::Application)
//!   opens the store, creates the built-in tables and owns the plugin manager.
//! - **Core Constants**: application name and version in `constants`.
//! - **Error Handling**: the top-level [`Error`](error::Error) and its
//!   `Result` alias.
pub mod bootstrap;
pub mod constants;
pub mod error;

pub use bootstrap::Application;
pub use error::{Error, Result};
