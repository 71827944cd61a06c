use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rusqlite::types::ValueRef;
use rusqlite::{Connection, params_from_iter};

use crate::storage::error::{StoreError, StoreResult};
use crate::storage::schema::SchemaRegistrar;
use crate::storage::value::{Record, Value, quote_identifier};

/// The process-wide persistent store.
///
/// Owns exactly one SQLite connection. Every mutating call auto-commits on
/// its own; there are no multi-statement transactions. Predicate values are
/// always bound as positional `?` parameters, and only validated identifiers
/// are ever spliced into statement text.
pub struct Store {
    /// `None` once the store has been closed
    conn: Mutex<Option<Connection>>,
    /// Location of the database file, `None` for in-memory stores
    path: Option<PathBuf>,
}

impl Store {
    /// Open (or create) the database at `path`, creating its parent
    /// directory if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                fs::create_dir_all(parent)
                    .map_err(|e| StoreError::io(e, "create_db_dir", parent.to_path_buf()))?;
            }
        }
        let conn = Connection::open(&path).map_err(|e| StoreError::sqlite(e, "open"))?;
        log::info!("Connected to database: {}", path.display());
        Ok(Self {
            conn: Mutex::new(Some(conn)),
            path: Some(path),
        })
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| StoreError::sqlite(e, "open"))?;
        log::debug!("Connected to in-memory database");
        Ok(Self {
            conn: Mutex::new(Some(conn)),
            path: None,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_open(&self) -> bool {
        self.conn.lock().map(|guard| guard.is_some()).unwrap_or(false)
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> StoreResult<T>) -> StoreResult<T> {
        let guard = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        match guard.as_ref() {
            Some(conn) => f(conn),
            None => Err(StoreError::Closed),
        }
    }

    /// Run a parameterized statement and return the number of affected rows.
    pub fn execute(&self, statement: &str, params: &[Value]) -> StoreResult<usize> {
        log::debug!("execute: {}", statement);
        self.with_conn(|conn| {
            conn.execute(statement, params_from_iter(params.iter()))
                .map_err(|e| StoreError::sqlite(e, "execute"))
        })
    }

    /// Run a parameterized query and collect every row as a [`Record`].
    pub fn query(&self, statement: &str, params: &[Value]) -> StoreResult<Vec<Record>> {
        log::debug!("query: {}", statement);
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(statement)
                .map_err(|e| StoreError::sqlite(e, "prepare"))?;
            let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
            let mut rows = stmt
                .query(params_from_iter(params.iter()))
                .map_err(|e| StoreError::sqlite(e, "query"))?;

            let mut records = Vec::new();
            while let Some(row) = rows.next().map_err(|e| StoreError::sqlite(e, "fetch_row"))? {
                let mut record = Record::new();
                for (index, name) in names.iter().enumerate() {
                    let value = row
                        .get_ref(index)
                        .map_err(|e| StoreError::sqlite(e, "read_column"))?;
                    record.insert(name.clone(), owned_value(value));
                }
                records.push(record);
            }
            Ok(records)
        })
    }

    /// Insert `data` into `table` and return the new row id.
    pub fn insert(&self, table: &str, data: &Record) -> StoreResult<i64> {
        let table_sql = quote_identifier(table)?;
        let statement = if data.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES", table_sql)
        } else {
            let columns = data
                .keys()
                .map(|k| quote_identifier(k))
                .collect::<StoreResult<Vec<_>>>()?;
            let placeholders = vec!["?"; data.len()].join(", ");
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                table_sql,
                columns.join(", "),
                placeholders
            )
        };
        let params: Vec<Value> = data.values().cloned().collect();

        log::debug!("insert: {}", statement);
        self.with_conn(|conn| {
            conn.execute(&statement, params_from_iter(params.iter()))
                .map_err(|e| StoreError::sqlite(e, "insert"))?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Select every column of `table`, optionally filtered by `filter`
    /// (a predicate with `?` placeholders bound to `params`) and ordered by
    /// `order_by` (a column name). Without `order_by` the order is whatever
    /// SQLite returns.
    pub fn select(
        &self,
        table: &str,
        filter: Option<&str>,
        params: &[Value],
        order_by: Option<&str>,
    ) -> StoreResult<Vec<Record>> {
        let mut statement = format!("SELECT * FROM {}", quote_identifier(table)?);
        if let Some(filter) = filter {
            statement.push_str(" WHERE ");
            statement.push_str(filter);
        }
        if let Some(column) = order_by {
            statement.push_str(" ORDER BY ");
            statement.push_str(&quote_identifier(column)?);
        }
        self.query(&statement, params)
    }

    /// Update the rows of `table` matching `filter` with the values in
    /// `data`. Returns the number of rows changed.
    pub fn update(
        &self,
        table: &str,
        data: &Record,
        filter: &str,
        filter_params: &[Value],
    ) -> StoreResult<usize> {
        if data.is_empty() {
            return Ok(0);
        }
        let assignments = data
            .keys()
            .map(|k| quote_identifier(k).map(|col| format!("{} = ?", col)))
            .collect::<StoreResult<Vec<_>>>()?;
        let statement = format!(
            "UPDATE {} SET {} WHERE {}",
            quote_identifier(table)?,
            assignments.join(", "),
            filter
        );
        let params: Vec<Value> = data
            .values()
            .cloned()
            .chain(filter_params.iter().cloned())
            .collect();
        self.execute(&statement, &params)
    }

    /// Delete the rows of `table` matching `filter`. Returns the number of
    /// rows removed.
    pub fn delete(&self, table: &str, filter: &str, params: &[Value]) -> StoreResult<usize> {
        let statement = format!("DELETE FROM {} WHERE {}", quote_identifier(table)?, filter);
        self.execute(&statement, params)
    }

    pub fn table_exists(&self, table: &str) -> StoreResult<bool> {
        let rows = self.query(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?",
            &[Value::Text(table.to_string())],
        )?;
        Ok(!rows.is_empty())
    }

    /// Column names of `table`, in declaration order.
    pub fn columns(&self, table: &str) -> StoreResult<Vec<String>> {
        let statement = format!("PRAGMA table_info({})", quote_identifier(table)?);
        let rows = self.query(&statement, &[])?;
        Ok(rows
            .into_iter()
            .filter_map(|mut row| match row.remove("name") {
                Some(Value::Text(name)) => Some(name),
                _ => None,
            })
            .collect())
    }

    /// Access the schema registrar bound to this store.
    pub fn schema(&self) -> SchemaRegistrar<'_> {
        SchemaRegistrar::new(self)
    }

    /// Close the connection. Calling this more than once is a no-op.
    pub fn close(&self) -> StoreResult<()> {
        let mut guard = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        if let Some(conn) = guard.take() {
            conn.close().map_err(|(_, e)| StoreError::sqlite(e, "close"))?;
            log::info!("Database connection closed");
        }
        Ok(())
    }
}

// TEXT cells are not guaranteed to be UTF-8 when other writers touch the file
fn owned_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Real(f),
        ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Blob(bytes.to_vec()),
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("path", &self.path)
            .field("open", &self.is_open())
            .finish()
    }
}
