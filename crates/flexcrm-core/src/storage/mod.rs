//! # FlexCRM Storage
//!
//! The persistence half of the core:
//!
//! - **[`store`]**: the single SQLite connection ([`Store`]) and the
//!   parameterized statement helpers built on it.
//! - **[`schema`]**: field declarations ([`FieldSchema`]) and idempotent
//!   table creation ([`SchemaRegistrar`]).
//! - **[`entity`]**: the generic active-record layer ([`Entity`]).
//! - **[`value`]**: the [`Record`] map exchanged between entities and the store.
//! - **[`config`]**: application configuration ([`AppConfig`]).
//! - **[`error`]**: [`StoreError`].
pub mod config;
pub mod entity;
pub mod error;
pub mod schema;
pub mod store;
pub mod value;

pub use config::{AppConfig, ConfigError, ConfigFormat};
pub use entity::{Entity, RecordMeta};
pub use error::{StoreError, StoreResult};
pub use schema::{FieldSchema, FieldType, SchemaRegistrar};
pub use store::Store;
pub use value::{Record, RecordExt, Value};

#[cfg(test)]
mod tests;
