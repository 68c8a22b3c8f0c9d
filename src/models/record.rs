// One sampled observation: elapsed time, executed SQL, call stack (outermost first).

use serde::{Deserialize, Serialize};
use std::time::Duration;
use wincode::{SchemaRead, SchemaWrite};

use super::StackFrame;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, SchemaRead, SchemaWrite)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    pub duration_secs: f64,
    pub sql: String,
    pub stack: Vec<StackFrame>,
}

impl LogRecord {
    pub fn new(elapsed: Duration, sql: impl Into<String>, stack: Vec<StackFrame>) -> Self {
        Self {
            duration_secs: elapsed.as_secs_f64(),
            sql: sql.into(),
            stack,
        }
    }

    /// Innermost frame: the application line that issued the statement.
    pub fn origin(&self) -> Option<&StackFrame> {
        self.stack.last()
    }
}
