// Database cursor capability set. Drivers implement `Cursor`; `ProfiledCursor` wraps any
// driver and forwards every capability, adding timing and sampled logging to execute calls.

mod profiled;
mod quote;
mod sqlite;

pub use profiled::ProfiledCursor;
pub use quote::{quote_value, render_sqlite_query};
pub use sqlite::SqliteCursor;

use std::future::Future;

use crate::models::{Row, Value};

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("sqlx: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("cursor is closed")]
    Closed,
    /// Errors raised by other drivers.
    #[error("{0}")]
    Driver(String),
}

/// A DB-API style cursor: execute statements, then read buffered result rows.
pub trait Cursor: Send {
    /// Run one statement. Returns rows affected (0 for statements that return rows).
    fn execute(
        &mut self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Result<u64, DbError>> + Send;

    /// Run `sql` once per parameter row. Returns the summed rows affected.
    fn execute_many(
        &mut self,
        sql: &str,
        param_list: &[Vec<Value>],
    ) -> impl Future<Output = Result<u64, DbError>> + Send;

    /// Next buffered row of the last query.
    fn fetch_one(&mut self) -> Option<Row>;

    /// Up to `size` buffered rows.
    fn fetch_many(&mut self, size: usize) -> Vec<Row> {
        let mut out = Vec::with_capacity(size);
        while out.len() < size {
            match self.fetch_one() {
                Some(row) => out.push(row),
                None => break,
            }
        }
        out
    }

    /// All remaining buffered rows.
    fn fetch_all(&mut self) -> Vec<Row> {
        let mut out = Vec::new();
        while let Some(row) = self.fetch_one() {
            out.push(row);
        }
        out
    }

    /// Rows affected by the last statement; `None` after a query or before any statement.
    fn row_count(&self) -> Option<u64>;

    /// Row id of the last successful insert.
    fn last_insert_id(&self) -> Option<i64>;

    /// Column names of the last query.
    fn description(&self) -> &[String];

    /// The statement as the driver sent it, parameters substituted.
    fn last_executed_query(&self, sql: &str, params: &[Value]) -> String;

    /// Release the connection and drop buffered rows.
    fn close(&mut self);

    /// Iterate over the remaining rows.
    fn rows(&mut self) -> Rows<'_, Self>
    where
        Self: Sized,
    {
        Rows { cursor: self }
    }
}

/// Row iterator over a cursor, built on `fetch_one`.
pub struct Rows<'a, C> {
    cursor: &'a mut C,
}

impl<C: Cursor> Iterator for Rows<'_, C> {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        self.cursor.fetch_one()
    }
}
