use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
pub use rusqlite::types::Value;

use crate::storage::error::{StoreError, StoreResult};

/// A row as seen by the generic persistence layer: column name -> value.
///
/// A `BTreeMap` keeps column order stable, so generated statements are
/// deterministic for a given record.
pub type Record = BTreeMap<String, Value>;

/// Name of the identity column present in every entity table
pub const ID_COLUMN: &str = "id";
/// Name of the creation timestamp column
pub const CREATED_AT_COLUMN: &str = "created_at";
/// Name of the last-save timestamp column
pub const UPDATED_AT_COLUMN: &str = "updated_at";

/// Columns managed by the entity base that no entity may declare itself
pub const RESERVED_COLUMNS: [&str; 3] = [ID_COLUMN, CREATED_AT_COLUMN, UPDATED_AT_COLUMN];

pub fn is_reserved(name: &str) -> bool {
    RESERVED_COLUMNS.contains(&name)
}

/// Table and column names are spliced into SQL text, so only plain
/// identifiers are accepted.
pub fn validate_identifier(name: &str) -> StoreResult<&str> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(name)
    } else {
        Err(StoreError::InvalidIdentifier(name.to_string()))
    }
}

/// Quote a validated identifier for use in a statement.
pub(crate) fn quote_identifier(name: &str) -> StoreResult<String> {
    validate_identifier(name).map(|n| format!("\"{}\"", n))
}

/// Format a timestamp the way every entity table stores it.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored ISO-8601 timestamp.
pub fn parse_timestamp(field: &str, value: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| StoreError::InvalidTimestamp {
            field: field.to_string(),
            value: value.to_string(),
        })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Integer(_) => "integer",
        Value::Real(_) => "real",
        Value::Text(_) => "text",
        Value::Blob(_) => "blob",
    }
}

/// Typed accessors for [`Record`], used by `from_record` implementations.
pub trait RecordExt {
    /// Required text field
    fn text(&self, field: &str) -> StoreResult<String>;
    /// Optional text field; a missing column or NULL is `None`
    fn opt_text(&self, field: &str) -> StoreResult<Option<String>>;
    /// Required integer field
    fn integer(&self, field: &str) -> StoreResult<i64>;
    /// Optional integer field
    fn opt_integer(&self, field: &str) -> StoreResult<Option<i64>>;
    /// Required real field; integers are widened
    fn real(&self, field: &str) -> StoreResult<f64>;
    /// Boolean stored as an integer (0 = false)
    fn boolean(&self, field: &str) -> StoreResult<bool>;
}

impl RecordExt for Record {
    fn text(&self, field: &str) -> StoreResult<String> {
        self.opt_text(field)?.ok_or_else(|| StoreError::MissingField {
            field: field.to_string(),
        })
    }

    fn opt_text(&self, field: &str) -> StoreResult<Option<String>> {
        match self.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Text(s)) => Ok(Some(s.clone())),
            Some(other) => Err(StoreError::FieldType {
                field: field.to_string(),
                expected: "text",
                found: type_name(other),
            }),
        }
    }

    fn integer(&self, field: &str) -> StoreResult<i64> {
        self.opt_integer(field)?.ok_or_else(|| StoreError::MissingField {
            field: field.to_string(),
        })
    }

    fn opt_integer(&self, field: &str) -> StoreResult<Option<i64>> {
        match self.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Integer(i)) => Ok(Some(*i)),
            Some(other) => Err(StoreError::FieldType {
                field: field.to_string(),
                expected: "integer",
                found: type_name(other),
            }),
        }
    }

    fn real(&self, field: &str) -> StoreResult<f64> {
        match self.get(field) {
            None | Some(Value::Null) => Err(StoreError::MissingField {
                field: field.to_string(),
            }),
            Some(Value::Real(r)) => Ok(*r),
            Some(Value::Integer(i)) => Ok(*i as f64),
            Some(other) => Err(StoreError::FieldType {
                field: field.to_string(),
                expected: "real",
                found: type_name(other),
            }),
        }
    }

    fn boolean(&self, field: &str) -> StoreResult<bool> {
        self.integer(field).map(|i| i != 0)
    }
}
