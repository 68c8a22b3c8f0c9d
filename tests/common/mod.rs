// Shared test helpers: a scripted in-memory cursor and record builders
#![allow(dead_code)]

use sqlprof::cursor::{Cursor, DbError};
use sqlprof::models::{LogRecord, Row, StackFrame, Value};
use sqlprof::profiler::{LogSink, Profiler, Sampler};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;

/// Cursor that serves scripted rows and records what it was asked to run.
#[derive(Debug, Default)]
pub struct MockCursor {
    pub executed: Vec<(String, Vec<Value>)>,
    pub executed_many: Vec<(String, usize)>,
    pub result_rows: Vec<Row>,
    pub columns: Vec<String>,
    pub fail_with: Option<String>,
    pub closed: bool,
    rows: VecDeque<Row>,
    row_count: Option<u64>,
    last_insert_id: Option<i64>,
}

impl MockCursor {
    pub fn with_rows(columns: &[&str], rows: Vec<Row>) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            result_rows: rows,
            ..Default::default()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Default::default()
        }
    }
}

impl Cursor for MockCursor {
    async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64, DbError> {
        self.executed.push((sql.to_string(), params.to_vec()));
        if let Some(message) = &self.fail_with {
            return Err(DbError::Driver(message.clone()));
        }
        self.rows = self.result_rows.iter().cloned().collect();
        if self.result_rows.is_empty() {
            self.row_count = Some(1);
            self.last_insert_id = Some(self.executed.len() as i64);
            Ok(1)
        } else {
            self.row_count = None;
            Ok(0)
        }
    }

    async fn execute_many(&mut self, sql: &str, param_list: &[Vec<Value>]) -> Result<u64, DbError> {
        self.executed_many.push((sql.to_string(), param_list.len()));
        if let Some(message) = &self.fail_with {
            return Err(DbError::Driver(message.clone()));
        }
        self.row_count = Some(param_list.len() as u64);
        Ok(param_list.len() as u64)
    }

    fn fetch_one(&mut self) -> Option<Row> {
        self.rows.pop_front()
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

    /// Marks substitution so tests can tell it apart from the template.
    fn last_executed_query(&self, sql: &str, params: &[Value]) -> String {
        format!("{} /* {:?} */", sql, params)
    }

    fn close(&mut self) {
        self.closed = true;
        self.rows.clear();
    }
}

/// Profiler that samples every statement into `path`.
pub fn always_profiler(path: &Path) -> Arc<Profiler> {
    Arc::new(Profiler::with_sampler(
        Sampler::seeded(1.0, 7),
        LogSink::new(path),
    ))
}

pub fn never_profiler(path: &Path) -> Arc<Profiler> {
    Arc::new(Profiler::with_sampler(
        Sampler::seeded(0.0, 7),
        LogSink::new(path),
    ))
}

pub fn frame(file: &str, line: u32, function: &str) -> StackFrame {
    StackFrame::new(file, line, function, format!("{}();", function))
}

/// Record whose innermost frame is `origin`, under a fixed outer frame.
pub fn record(duration_secs: f64, sql: &str, origin: StackFrame) -> LogRecord {
    LogRecord {
        duration_secs,
        sql: sql.to_string(),
        stack: vec![frame("src/main.rs", 1, "app::main"), origin],
    }
}

/// Decode every line of a log file.
pub fn read_log(path: &Path) -> Vec<LogRecord> {
    let text = std::fs::read_to_string(path).unwrap_or_default();
    text.lines()
        .map(|l| sqlprof::codec::decode_line(l).expect("decode log line"))
        .collect()
}
