//! SQLite-backed table storage.
//!
//! [`Database`] owns one connection and hands out [`TableGateway`]s bound to
//! a [`Table`]. There is no pooling and no explicit transaction scope: each
//! gateway call is a single statement.

mod gateway;
pub mod query;
mod schema;
mod value;

use std::time::Duration;

use rusqlite::{Connection, OpenFlags};

use crate::config::DatabaseConfig;
use crate::error::Error;

pub use gateway::TableGateway;
pub use query::SortOrder;
pub use schema::Table;
pub use value::{record, Record, RecordExt, Value};

/// An open database with the site schema applied.
#[derive(Debug)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens (creating if needed) the database named in the configuration.
    pub fn open(config: &DatabaseConfig) -> Result<Self, Error> {
        let conn = if config.path == ":memory:" {
            Connection::open_in_memory()
        } else {
            let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX;
            Connection::open_with_flags(&config.path, flags)
        }
        .map_err(Error::storage("sqlite", "open"))?;
        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))
            .map_err(Error::storage("sqlite", "configure"))?;
        Self::from_connection(conn)
    }

    /// A private in-memory database.
    pub fn open_in_memory() -> Result<Self, Error> {
        Self::open(&DatabaseConfig::default())
    }

    fn from_connection(conn: Connection) -> Result<Self, Error> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(Error::storage("sqlite", "configure"))?;
        for table in Table::ALL {
            conn.execute_batch(table.ddl())
                .map_err(Error::storage(table.name(), "create"))?;
        }
        tracing::debug!("database schema ready");
        Ok(Self { conn })
    }

    /// A gateway bound to `table`.
    pub fn table(&self, table: Table) -> TableGateway<'_> {
        TableGateway::new(&self.conn, table)
    }
}
