//! The fixed set of tables the site stores data in.

use std::fmt;

use crate::error::Error;

/// A table the gateway can be bound to.
///
/// Table and column identifiers only ever come from here; nothing a visitor
/// submits is interpolated into SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    /// Registered accounts
    Users,
    /// Published articles
    Articles,
    /// Article categories
    Categories,
    /// Comments left on articles
    Comments,
    /// Contact-form inquiries
    Inquiries,
}

impl Table {
    /// Every table, in schema creation order.
    pub const ALL: [Table; 5] = [
        Table::Users,
        Table::Categories,
        Table::Articles,
        Table::Comments,
        Table::Inquiries,
    ];

    /// SQL table name.
    pub fn name(self) -> &'static str {
        match self {
            Table::Users => "users",
            Table::Articles => "article",
            Table::Categories => "category",
            Table::Comments => "comments",
            Table::Inquiries => "inquiries",
        }
    }

    /// Primary-key column.
    pub fn primary_key(self) -> &'static str {
        match self {
            Table::Users => "uid",
            _ => "id",
        }
    }

    /// Columns callers may read, filter, order by, or write.
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Table::Users => &[
                "uid",
                "username",
                "firstname",
                "surname",
                "email",
                "password",
                "phone_num",
                "permissions",
            ],
            Table::Articles => &[
                "id",
                "title",
                "description",
                "categoryId",
                "date",
                "uid",
                "path",
            ],
            Table::Categories => &["id", "name"],
            Table::Comments => &[
                "id",
                "articleId",
                "firstname",
                "surname",
                "email",
                "text",
                "date",
                "username",
            ],
            Table::Inquiries => &[
                "id",
                "title",
                "inquiry",
                "firstname",
                "surname",
                "email",
                "phone_num",
                "date",
                "username",
                "status",
            ],
        }
    }

    /// Returns the column's canonical spelling, or an argument error if the
    /// table has no such column.
    pub fn column(self, name: &str) -> Result<&'static str, Error> {
        if name.is_empty() {
            return Err(Error::argument(format!(
                "empty column name for table `{}`",
                self.name()
            )));
        }
        self.columns()
            .iter()
            .copied()
            .find(|c| *c == name)
            .ok_or_else(|| {
                Error::argument(format!(
                    "table `{}` has no column `{}`",
                    self.name(),
                    name
                ))
            })
    }

    pub(crate) fn ddl(self) -> &'static str {
        match self {
            Table::Users => {
                "CREATE TABLE IF NOT EXISTS users (
                    uid INTEGER PRIMARY KEY AUTOINCREMENT,
                    username TEXT NOT NULL UNIQUE,
                    firstname TEXT NOT NULL,
                    surname TEXT NOT NULL,
                    email TEXT NOT NULL UNIQUE,
                    password TEXT NOT NULL,
                    phone_num TEXT NOT NULL,
                    permissions INTEGER NOT NULL DEFAULT 0
                );"
            }
            Table::Categories => {
                "CREATE TABLE IF NOT EXISTS category (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL
                );"
            }
            Table::Articles => {
                "CREATE TABLE IF NOT EXISTS article (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    title TEXT NOT NULL,
                    description TEXT NOT NULL,
                    categoryId INTEGER NOT NULL,
                    date TEXT NOT NULL,
                    uid INTEGER,
                    path TEXT
                );"
            }
            Table::Comments => {
                "CREATE TABLE IF NOT EXISTS comments (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    articleId INTEGER NOT NULL,
                    firstname TEXT NOT NULL,
                    surname TEXT NOT NULL,
                    email TEXT NOT NULL,
                    text TEXT NOT NULL,
                    date TEXT NOT NULL,
                    username TEXT
                );"
            }
            Table::Inquiries => {
                "CREATE TABLE IF NOT EXISTS inquiries (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    title TEXT NOT NULL,
                    inquiry TEXT NOT NULL,
                    firstname TEXT NOT NULL,
                    surname TEXT NOT NULL,
                    email TEXT NOT NULL,
                    phone_num TEXT NOT NULL,
                    date TEXT NOT NULL,
                    username TEXT,
                    status TEXT NOT NULL DEFAULT 'Pending'
                );"
            }
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
