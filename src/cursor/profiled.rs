// Timing wrapper around any cursor. execute / execute_many are timed and offered to the
// profiler after the wrapped call returns, whatever its outcome; everything else forwards.

use std::sync::Arc;
use std::time::Instant;

use super::{Cursor, DbError};
use crate::models::{Row, Value};
use crate::profiler::Profiler;

pub struct ProfiledCursor<C> {
    inner: C,
    profiler: Arc<Profiler>,
}

impl<C: Cursor> ProfiledCursor<C> {
    pub fn new(inner: C, profiler: Arc<Profiler>) -> Self {
        Self { inner, profiler }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

impl<C: Cursor> Cursor for ProfiledCursor<C> {
    async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64, DbError> {
        let start = Instant::now();
        let result = self.inner.execute(sql, params).await;
        let elapsed = start.elapsed();
        let inner = &self.inner;
        self.profiler
            .log_sql_with(|| inner.last_executed_query(sql, params), elapsed);
        result
    }

    /// Logs the statement template; per-row parameters are not substituted.
    async fn execute_many(&mut self, sql: &str, param_list: &[Vec<Value>]) -> Result<u64, DbError> {
        let start = Instant::now();
        let result = self.inner.execute_many(sql, param_list).await;
        let elapsed = start.elapsed();
        self.profiler.log_sql(sql, elapsed);
        result
    }

    fn fetch_one(&mut self) -> Option<Row> {
        self.inner.fetch_one()
    }

    fn fetch_many(&mut self, size: usize) -> Vec<Row> {
        self.inner.fetch_many(size)
    }

    fn fetch_all(&mut self) -> Vec<Row> {
        self.inner.fetch_all()
    }

    fn row_count(&self) -> Option<u64> {
        self.inner.row_count()
    }

    fn last_insert_id(&self) -> Option<i64> {
        self.inner.last_insert_id()
    }

    fn description(&self) -> &[String] {
        self.inner.description()
    }

    fn last_executed_query(&self, sql: &str, params: &[Value]) -> String {
        self.inner.last_executed_query(sql, params)
    }

    fn close(&mut self) {
        self.inner.close()
    }
}
