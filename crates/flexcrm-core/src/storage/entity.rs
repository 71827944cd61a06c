//! # Entity Base
//!
//! Active-record style persistence for any type that can describe itself as
//! a [`Record`]. There is no reflection: every entity supplies an explicit
//! `to_record` / `from_record` pair, and the provided methods of [`Entity`]
//! only ever operate on the resulting maps. Built-in modules and plugins go
//! through exactly the same code path.
use chrono::{DateTime, Duration, SubsecRound, Utc};

use crate::storage::error::{StoreError, StoreResult};
use crate::storage::schema::FieldSchema;
use crate::storage::store::Store;
use crate::storage::value::{
    CREATED_AT_COLUMN, ID_COLUMN, Record, RecordExt, UPDATED_AT_COLUMN, Value, format_timestamp,
    is_reserved, parse_timestamp,
};

const ID_FILTER: &str = "\"id\" = ?";

/// Identity and timestamps shared by every entity.
///
/// `id` stays `None` until the first successful save and never changes
/// afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordMeta {
    id: Option<i64>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl RecordMeta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Read the reserved columns out of a stored row.
    pub fn from_record(record: &Record) -> StoreResult<Self> {
        let timestamp = |field: &str| -> StoreResult<Option<DateTime<Utc>>> {
            record
                .opt_text(field)?
                .map(|raw| parse_timestamp(field, &raw))
                .transpose()
        };
        Ok(Self {
            id: record.opt_integer(ID_COLUMN)?,
            created_at: timestamp(CREATED_AT_COLUMN)?,
            updated_at: timestamp(UPDATED_AT_COLUMN)?,
        })
    }

    /// Timestamp for the next save: now at storage precision, nudged past
    /// the previous `updated_at` so it strictly increases.
    fn next_timestamp(&self) -> DateTime<Utc> {
        let now = Utc::now().trunc_subsecs(6);
        match self.updated_at {
            Some(previous) if previous >= now => previous + Duration::microseconds(1),
            _ => now,
        }
    }
}

/// A typed, identity-bearing record persisted through the generic CRUD layer.
pub trait Entity: Sized {
    /// Table holding this entity type
    const TABLE: &'static str;

    /// Declared fields, excluding the reserved columns
    fn fields() -> FieldSchema;

    fn meta(&self) -> &RecordMeta;

    fn meta_mut(&mut self) -> &mut RecordMeta;

    /// Type-specific fields of this entity. Must not contain reserved columns.
    fn to_record(&self) -> Record;

    /// Build an entity from a stored row. Reserved columns are restored by
    /// the entity base afterwards and can be ignored here.
    fn from_record(record: &Record) -> StoreResult<Self>;

    fn id(&self) -> Option<i64> {
        self.meta().id()
    }

    /// Ensure this entity's table exists.
    fn create_table(store: &Store) -> StoreResult<()> {
        store.schema().create_table(Self::TABLE, &Self::fields())
    }

    /// Rebuild an entity, identity and timestamps included, from a row.
    fn hydrate(record: Record) -> StoreResult<Self> {
        let meta = RecordMeta::from_record(&record)?;
        let mut entity = Self::from_record(&record)?;
        *entity.meta_mut() = meta;
        Ok(entity)
    }

    /// Insert when the identity is unset, otherwise update by identity.
    ///
    /// Both paths refresh `updated_at`; insert also sets `created_at` and
    /// assigns the identity returned by the store. The in-memory metadata is
    /// only touched once the statement has succeeded.
    fn save(&mut self, store: &Store) -> StoreResult<i64> {
        let mut data = self.to_record();
        if let Some(field) = data.keys().find(|k| is_reserved(k)) {
            return Err(StoreError::ReservedField {
                table: Self::TABLE.to_string(),
                field: field.clone(),
            });
        }

        let now = self.meta().next_timestamp();
        data.insert(UPDATED_AT_COLUMN.to_string(), Value::Text(format_timestamp(&now)));

        match self.meta().id {
            Some(id) => {
                let changed = store.update(Self::TABLE, &data, ID_FILTER, &[Value::Integer(id)])?;
                if changed == 0 {
                    return Err(StoreError::MissingRow {
                        table: Self::TABLE.to_string(),
                        id,
                    });
                }
                self.meta_mut().updated_at = Some(now);
                Ok(id)
            }
            None => {
                data.insert(CREATED_AT_COLUMN.to_string(), Value::Text(format_timestamp(&now)));
                let id = store.insert(Self::TABLE, &data)?;
                let meta = self.meta_mut();
                meta.id = Some(id);
                meta.created_at = Some(now);
                meta.updated_at = Some(now);
                Ok(id)
            }
        }
    }

    /// Fetch by identity. A missing row is `Ok(None)`, not an error.
    fn get(store: &Store, id: i64) -> StoreResult<Option<Self>> {
        store
            .select(Self::TABLE, Some(ID_FILTER), &[Value::Integer(id)], None)?
            .into_iter()
            .next()
            .map(Self::hydrate)
            .transpose()
    }

    /// All entities matching an optional predicate (`?` placeholders bound
    /// to `params`), in ascending identity order.
    fn get_all(store: &Store, filter: Option<&str>, params: &[Value]) -> StoreResult<Vec<Self>> {
        store
            .select(Self::TABLE, filter, params, Some(ID_COLUMN))?
            .into_iter()
            .map(Self::hydrate)
            .collect()
    }

    /// Remove this entity's row. Returns `false` without touching the store
    /// when the entity was never persisted.
    fn delete(&self, store: &Store) -> StoreResult<bool> {
        match self.meta().id {
            Some(id) => Ok(store.delete(Self::TABLE, ID_FILTER, &[Value::Integer(id)])? > 0),
            None => Ok(false),
        }
    }
}
