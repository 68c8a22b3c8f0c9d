// SQLite driver cursor on a pooled sqlx connection. Query results are buffered on execute.

use sqlx::pool::PoolConnection;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Column, Executor, Row as _, Sqlite, Statement, TypeInfo, ValueRef};
use std::collections::VecDeque;

use super::{Cursor, DbError, quote};
use crate::models::{Row, Value};

pub struct SqliteCursor {
    conn: Option<PoolConnection<Sqlite>>,
    columns: Vec<String>,
    rows: VecDeque<Row>,
    row_count: Option<u64>,
    last_insert_id: Option<i64>,
}

impl SqliteCursor {
    pub fn new(conn: PoolConnection<Sqlite>) -> Self {
        Self {
            conn: Some(conn),
            columns: Vec::new(),
            rows: VecDeque::new(),
            row_count: None,
            last_insert_id: None,
        }
    }

    fn reset(&mut self) {
        self.columns.clear();
        self.rows.clear();
        self.row_count = None;
    }
}

impl Cursor for SqliteCursor {
    async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64, DbError> {
        self.reset();
        let conn = self.conn.as_mut().ok_or(DbError::Closed)?;
        let stmt = (&mut **conn).prepare(sql).await?;

        if stmt.columns().is_empty() {
            let result = bind_params(stmt.query(), params)
                .execute(&mut **conn)
                .await?;
            self.row_count = Some(result.rows_affected());
            if result.rows_affected() > 0 {
                self.last_insert_id = Some(result.last_insert_rowid());
            }
            return Ok(result.rows_affected());
        }

        let columns = stmt.columns().iter().map(|c| c.name().to_string()).collect();
        let rows = bind_params(stmt.query(), params)
            .fetch_all(&mut **conn)
            .await?;
        self.columns = columns;
        self.rows = rows
            .iter()
            .map(decode_row)
            .collect::<Result<VecDeque<_>, _>>()?;
        Ok(0)
    }

    async fn execute_many(&mut self, sql: &str, param_list: &[Vec<Value>]) -> Result<u64, DbError> {
        self.reset();
        let conn = self.conn.as_mut().ok_or(DbError::Closed)?;
        let stmt = (&mut **conn).prepare(sql).await?;

        let mut total = 0u64;
        for params in param_list {
            let result = bind_params(stmt.query(), params)
                .execute(&mut **conn)
                .await?;
            total += result.rows_affected();
            if result.rows_affected() > 0 {
                self.last_insert_id = Some(result.last_insert_rowid());
            }
        }
        self.row_count = Some(total);
        Ok(total)
    }

    fn fetch_one(&mut self) -> Option<Row> {
        self.rows.pop_front()
    }

    fn fetch_many(&mut self, size: usize) -> Vec<Row> {
        let n = size.min(self.rows.len());
        self.rows.drain(..n).collect()
    }

    fn fetch_all(&mut self) -> Vec<Row> {
        self.rows.drain(..).collect()
    }

    fn row_count(&self) -> Option<u64> {
        self.row_count
    }

    fn last_insert_id(&self) -> Option<i64> {
        self.last_insert_id
    }

    fn description(&self) -> &[String] {
        &self.columns
    }

    fn last_executed_query(&self, sql: &str, params: &[Value]) -> String {
        quote::render_sqlite_query(sql, params)
    }

    fn close(&mut self) {
        self.reset();
        self.conn = None;
    }
}

fn bind_params<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    params: &[Value],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for param in params {
        query = match param {
            Value::Null => query.bind(None::<i64>),
            Value::Integer(v) => query.bind(*v),
            Value::Real(v) => query.bind(*v),
            Value::Text(v) => query.bind(v.clone()),
            Value::Blob(v) => query.bind(v.clone()),
        };
    }
    query
}

fn decode_row(row: &SqliteRow) -> Result<Row, sqlx::Error> {
    (0..row.len()).map(|i| decode_value(row, i)).collect()
}

/// Decode by the storage class of the value itself, not the declared column type.
fn decode_value(row: &SqliteRow, index: usize) -> Result<Value, sqlx::Error> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let value = match raw.type_info().name() {
        "INTEGER" => Value::Integer(row.try_get(index)?),
        "REAL" => Value::Real(row.try_get(index)?),
        "BLOB" => Value::Blob(row.try_get(index)?),
        _ => Value::Text(row.try_get(index)?),
    };
    Ok(value)
}
