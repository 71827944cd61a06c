use std::fmt;

use crate::storage::error::{StoreError, StoreResult};
use crate::storage::store::Store;
use crate::storage::value::{
    CREATED_AT_COLUMN, ID_COLUMN, UPDATED_AT_COLUMN, is_reserved, quote_identifier,
};

/// Storage type tag of a declared field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Integer,
    Real,
    /// Stored as an INTEGER holding 0 or 1
    Boolean,
    Blob,
}

impl FieldType {
    /// Column type used in `CREATE TABLE`
    pub fn sql_type(&self) -> &'static str {
        match self {
            FieldType::Text => "TEXT",
            FieldType::Integer | FieldType::Boolean => "INTEGER",
            FieldType::Real => "REAL",
            FieldType::Blob => "BLOB",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_type())
    }
}

/// Ordered field name -> type declaration of an entity table.
///
/// The reserved columns (`id`, `created_at`, `updated_at`) are implied and
/// must not be declared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSchema {
    fields: Vec<(String, FieldType)>,
}

impl FieldSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field declaration. A repeated name replaces the
    /// earlier type in place.
    pub fn field(mut self, name: &str, field_type: FieldType) -> Self {
        match self.fields.iter_mut().find(|(n, _)| n == name) {
            Some(existing) => existing.1 = field_type,
            None => self.fields.push((name.to_string(), field_type)),
        }
        self
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, FieldType)> {
        self.fields.iter().map(|(n, t)| (n.as_str(), *t))
    }

    pub fn get(&self, name: &str) -> Option<FieldType> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, t)| *t)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Render the column list for `table`, reserved columns first.
    pub fn column_definitions(&self, table: &str) -> StoreResult<Vec<String>> {
        let mut columns = vec![
            format!("{} INTEGER PRIMARY KEY AUTOINCREMENT", quote_identifier(ID_COLUMN)?),
            format!("{} TEXT", quote_identifier(CREATED_AT_COLUMN)?),
            format!("{} TEXT", quote_identifier(UPDATED_AT_COLUMN)?),
        ];
        for (name, field_type) in self.fields() {
            if is_reserved(name) {
                return Err(StoreError::ReservedField {
                    table: table.to_string(),
                    field: name.to_string(),
                });
            }
            columns.push(format!("{} {}", quote_identifier(name)?, field_type.sql_type()));
        }
        Ok(columns)
    }
}

/// Creates entity tables from declared field schemas.
///
/// Creation is "create if absent": an existing table is never altered, even
/// when a later call declares a different field set.
pub struct SchemaRegistrar<'s> {
    store: &'s Store,
}

impl<'s> SchemaRegistrar<'s> {
    pub fn new(store: &'s Store) -> Self {
        Self { store }
    }

    pub fn create_table(&self, table: &str, schema: &FieldSchema) -> StoreResult<()> {
        let columns = schema.column_definitions(table)?;
        let statement = format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote_identifier(table)?,
            columns.join(", ")
        );
        self.store.execute(&statement, &[])?;
        log::debug!("Ensured table '{}' ({} declared fields)", table, schema.len());
        Ok(())
    }
}
