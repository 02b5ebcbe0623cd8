use rusqlite::{params_from_iter, Connection};

use super::query::{self, Ordering, Statement};
use super::schema::Table;
use super::value::{Record, Value};
use crate::error::Error;

/// Generic CRUD access to one table.
///
/// A gateway borrows the connection from a [`Database`](super::Database) and
/// is bound to one [`Table`]; its primary key and column set come from the
/// table, so every identifier in the generated SQL is known up front. Only
/// values are bound as parameters.
///
/// # Examples
///
/// ```
/// use newsdesk::{record, Database, RecordExt, Table};
///
/// let db = Database::open_in_memory().unwrap();
/// let categories = db.table(Table::Categories);
/// categories.insert(&record([("name", "Sport".into())])).unwrap();
///
/// let rows = categories.find("name", "Sport", None, None).unwrap();
/// assert_eq!(rows.len(), 1);
/// assert_eq!(rows[0].text("name"), Some("Sport"));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TableGateway<'db> {
    conn: &'db Connection,
    table: Table,
}

impl<'db> TableGateway<'db> {
    pub(crate) fn new(conn: &'db Connection, table: Table) -> Self {
        Self { conn, table }
    }

    /// The table this gateway is bound to.
    pub fn table(&self) -> Table {
        self.table
    }

    /// Rows whose `field` equals `value`.
    ///
    /// Ordering is applied only when both `order_by` and `sort` are given.
    ///
    /// # Errors
    ///
    /// [`Error::Argument`] for an empty field, an empty value, an unknown
    /// column, or a sort direction other than `asc`/`desc`. All of these are
    /// raised before the database is touched.
    pub fn find(
        &self,
        field: &str,
        value: impl Into<Value>,
        order_by: Option<&str>,
        sort: Option<&str>,
    ) -> Result<Vec<Record>, Error> {
        let value = value.into();
        if field.is_empty() || value.is_empty() {
            return Err(Error::argument(format!(
                "find on `{}` needs a non-empty field and value",
                self.table
            )));
        }
        let ordering = Ordering::resolve(self.table, order_by, sort)?;
        let column = self.table.column(field)?;
        self.fetch(query::select(self.table, Some((column, value)), ordering), "find")
    }

    /// Every row, optionally ordered.
    pub fn find_all(&self, order_by: Option<&str>, sort: Option<&str>) -> Result<Vec<Record>, Error> {
        let ordering = Ordering::resolve(self.table, order_by, sort)?;
        self.fetch(query::select(self.table, None, ordering), "find_all")
    }

    /// The single row with this primary key, if any.
    pub fn find_by_key(&self, key: impl Into<Value>) -> Result<Option<Record>, Error> {
        Ok(self
            .find(self.table.primary_key(), key, None, None)?
            .into_iter()
            .next())
    }

    /// Inserts one row from the supplied columns and returns its rowid.
    pub fn insert(&self, values: &Record) -> Result<i64, Error> {
        let stmt = query::insert(self.table, values)?;
        self.execute(&stmt, "insert")?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Updates the row identified by the record's primary key.
    ///
    /// Every supplied column is written; concurrent writers are
    /// last-write-wins. Returns the number of rows changed.
    ///
    /// # Errors
    ///
    /// [`Error::Argument`] if the primary key is missing or empty; nothing
    /// is written in that case.
    pub fn update(&self, values: &Record) -> Result<usize, Error> {
        let stmt = query::update(self.table, values)?;
        self.execute(&stmt, "update")
    }

    /// Deletes the row with this primary key. Returns rows removed (0 or 1).
    pub fn delete(&self, key: impl Into<Value>) -> Result<usize, Error> {
        let key = key.into();
        if key.is_empty() {
            return Err(Error::argument(format!(
                "delete on `{}` needs a primary key value",
                self.table
            )));
        }
        self.execute(&query::delete(self.table, key), "delete")
    }

    fn execute(&self, stmt: &Statement, operation: &'static str) -> Result<usize, Error> {
        tracing::debug!(table = %self.table, operation, sql = %stmt.sql, "executing statement");
        self.conn
            .execute(&stmt.sql, params_from_iter(stmt.params.iter()))
            .map_err(Error::storage(self.table.name(), operation))
    }

    fn fetch(&self, stmt: Statement, operation: &'static str) -> Result<Vec<Record>, Error> {
        tracing::debug!(table = %self.table, operation, sql = %stmt.sql, "running query");
        let wrap = || Error::storage(self.table.name(), operation);
        let mut prepared = self.conn.prepare(&stmt.sql).map_err(wrap())?;
        let names: Vec<String> = prepared
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        let rows = prepared
            .query_map(params_from_iter(stmt.params.iter()), |row| {
                let mut record = Record::new();
                for (i, name) in names.iter().enumerate() {
                    record.insert(name.clone(), row.get::<_, Value>(i)?);
                }
                Ok(record)
            })
            .map_err(wrap())?;
        rows.collect::<Result<Vec<_>, _>>().map_err(wrap())
    }
}
