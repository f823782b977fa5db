//! Multi-row INSERT / DELETE statements with positional parameters.
//!
//! Row `r`, column `c` (both 0-based) binds to placeholder `r * N + c + 1`,
//! and the argument list is emitted in the same row-major order.

use crate::error::AppError;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};

/// SQLite's default `SQLITE_MAX_VARIABLE_NUMBER` since 3.32.
pub const MAX_BIND_PARAMS: usize = 32_766;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Placeholder {
    /// `?1, ?2, ...`
    #[default]
    Numbered,
    /// `$1, $2, ...`
    Dollar,
}

impl Placeholder {
    fn render(self, index: usize) -> String {
        match self {
            Self::Numbered => format!("?{}", index),
            Self::Dollar => format!("${}", index),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BulkStatement {
    pub sql: String,
    pub args: Vec<Value>,
}

impl BulkStatement {
    pub fn execute(&self, conn: &Connection) -> Result<usize, AppError> {
        Ok(conn.execute(&self.sql, params_from_iter(self.args.iter()))?)
    }
}

/// OR clauses per DELETE. SQLite parses the disjunction as a left-deep
/// tree and caps expression depth at 1000 (`SQLITE_MAX_EXPR_DEPTH`).
pub const MAX_OR_CLAUSES: usize = 500;

/// Rows of `columns` width that fit in one statement.
pub fn max_rows_per_statement(columns: usize) -> usize {
    (MAX_BIND_PARAMS / columns.max(1)).max(1)
}

/// Rows of `columns` width that fit in one `bulk_delete` statement.
pub fn max_delete_rows_per_statement(columns: usize) -> usize {
    max_rows_per_statement(columns).min(MAX_OR_CLAUSES)
}

/// `INSERT INTO table (c1, ..., cN) VALUES (..), (..)` for every row.
///
/// # Panics
/// When `rows` is empty; callers skip the statement instead.
pub fn bulk_insert<R, const N: usize>(
    style: Placeholder,
    table: &str,
    columns: [&str; N],
    rows: &[R],
    row_values: impl Fn(&R) -> [Value; N],
) -> BulkStatement {
    assert!(!rows.is_empty(), "bulk insert into {} with no rows", table);

    let mut args = Vec::with_capacity(rows.len() * N);
    let tuples: Vec<String> = rows
        .iter()
        .enumerate()
        .map(|(r, row)| {
            let placeholders: Vec<String> =
                (0..N).map(|c| style.render(r * N + c + 1)).collect();
            args.extend(row_values(row));
            format!("({})", placeholders.join(", "))
        })
        .collect();

    BulkStatement {
        sql: format!(
            "INSERT INTO {} ({}) VALUES {}",
            table,
            columns.join(", "),
            tuples.join(", ")
        ),
        args,
    }
}

/// `DELETE FROM table WHERE (c1=.. AND c2=..) OR (..)`, one clause per row.
///
/// # Panics
/// When `rows` is empty; an empty disjunction would be invalid SQL.
pub fn bulk_delete<R, const N: usize>(
    style: Placeholder,
    table: &str,
    columns: [&str; N],
    rows: &[R],
    row_values: impl Fn(&R) -> [Value; N],
) -> BulkStatement {
    assert!(!rows.is_empty(), "bulk delete from {} with no rows", table);

    let mut args = Vec::with_capacity(rows.len() * N);
    let clauses: Vec<String> = rows
        .iter()
        .enumerate()
        .map(|(r, row)| {
            let predicates: Vec<String> = columns
                .iter()
                .enumerate()
                .map(|(c, column)| format!("{}={}", column, style.render(r * N + c + 1)))
                .collect();
            args.extend(row_values(row));
            format!("({})", predicates.join(" AND "))
        })
        .collect();

    BulkStatement {
        sql: format!("DELETE FROM {} WHERE {}", table, clauses.join(" OR ")),
        args,
    }
}
