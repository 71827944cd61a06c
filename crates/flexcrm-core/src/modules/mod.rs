//! Built-in business modules, persisted through the same entity base as
//! plugin entities.
pub mod clients;

pub use clients::Client;
