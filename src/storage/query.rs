//! Parameter-bound SQL statement builder.

use std::fmt;
use std::str::FromStr;

use super::schema::Table;
use super::value::{Record, Value};
use crate::error::Error;

/// Sort direction for ordered reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Ascending
    Asc,
    /// Descending
    Desc,
}

impl FromStr for SortOrder {
    type Err = Error;

    /// Accepts `asc` or `desc` in any letter case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("asc") {
            Ok(SortOrder::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Ok(SortOrder::Desc)
        } else {
            Err(Error::argument(format!(
                "sort must be ASC or DESC, got `{s}`"
            )))
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Asc => f.write_str("ASC"),
            SortOrder::Desc => f.write_str("DESC"),
        }
    }
}

/// A validated `ORDER BY` clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ordering {
    column: &'static str,
    order: SortOrder,
}

impl Ordering {
    /// Resolves optional `order_by`/`sort` arguments.
    ///
    /// The sort direction is checked first whenever it is given, so a bad
    /// direction fails even without a column. When either half is missing
    /// the read is unordered.
    pub fn resolve(
        table: Table,
        order_by: Option<&str>,
        sort: Option<&str>,
    ) -> Result<Option<Self>, Error> {
        let order = sort.map(SortOrder::from_str).transpose()?;
        match (order_by, order) {
            (Some(column), Some(order)) => Ok(Some(Self {
                column: table.column(column)?,
                order,
            })),
            _ => Ok(None),
        }
    }
}

/// A finished statement: SQL text plus positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// SQL with `?N` placeholders
    pub sql: String,
    /// Values bound to the placeholders, in order
    pub params: Vec<Value>,
}

fn quote(ident: &str) -> String {
    format!("\"{ident}\"")
}

/// `SELECT *` with an optional equality filter and ordering.
pub fn select(table: Table, filter: Option<(&'static str, Value)>, ordering: Option<Ordering>) -> Statement {
    let mut sql = format!("SELECT * FROM {}", quote(table.name()));
    let mut params = Vec::new();
    if let Some((column, value)) = filter {
        sql.push_str(&format!(" WHERE {} = ?1", quote(column)));
        params.push(value);
    }
    if let Some(ordering) = ordering {
        sql.push_str(&format!(
            " ORDER BY {} {}",
            quote(ordering.column),
            ordering.order
        ));
    }
    Statement { sql, params }
}

/// `INSERT` of every supplied column. Columns are checked against the table.
pub fn insert(table: Table, values: &Record) -> Result<Statement, Error> {
    if values.is_empty() {
        return Err(Error::argument(format!(
            "insert into `{}` needs at least one value",
            table.name()
        )));
    }
    let mut columns = Vec::with_capacity(values.len());
    let mut placeholders = Vec::with_capacity(values.len());
    let mut params = Vec::with_capacity(values.len());
    for (i, (column, value)) in values.iter().enumerate() {
        columns.push(quote(table.column(column)?));
        placeholders.push(format!("?{}", i + 1));
        params.push(value.clone());
    }
    Ok(Statement {
        sql: format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote(table.name()),
            columns.join(", "),
            placeholders.join(", ")
        ),
        params,
    })
}

/// `UPDATE` of every supplied column on the row matching the primary key.
pub fn update(table: Table, values: &Record) -> Result<Statement, Error> {
    let pk = table.primary_key();
    let key = values
        .get(pk)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            Error::argument(format!(
                "update on `{}` requires a value for primary key `{}`",
                table.name(),
                pk
            ))
        })?;

    let mut assignments = Vec::with_capacity(values.len());
    let mut params = Vec::with_capacity(values.len() + 1);
    for (column, value) in values {
        let column = table.column(column)?;
        params.push(value.clone());
        assignments.push(format!("{} = ?{}", quote(column), params.len()));
    }
    params.push(key.clone());
    Ok(Statement {
        sql: format!(
            "UPDATE {} SET {} WHERE {} = ?{}",
            quote(table.name()),
            assignments.join(", "),
            quote(pk),
            params.len()
        ),
        params,
    })
}

/// `DELETE` of the row matching the primary key.
pub fn delete(table: Table, key: Value) -> Statement {
    Statement {
        sql: format!(
            "DELETE FROM {} WHERE {} = ?1",
            quote(table.name()),
            quote(table.primary_key())
        ),
        params: vec![key],
    }
}
