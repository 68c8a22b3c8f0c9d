// Call-site frame captured when a statement is sampled. Doubles as the aggregation key.

use serde::{Deserialize, Serialize};
use std::fmt;
use wincode::{SchemaRead, SchemaWrite};

const UNKNOWN: &str = "<unknown>";

#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    SchemaRead,
    SchemaWrite,
)]
#[serde(rename_all = "camelCase")]
pub struct StackFrame {
    pub file: String,
    pub line: u32,
    pub function: String,
    /// Text of the source line, empty when the file could not be read.
    pub source: String,
}

impl StackFrame {
    pub fn new(
        file: impl Into<String>,
        line: u32,
        function: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            line,
            function: function.into(),
            source: source.into(),
        }
    }

    /// Placeholder recorded when no application frame survives trimming.
    pub fn unknown() -> Self {
        Self::new(UNKNOWN, 0, UNKNOWN, "")
    }

    pub fn is_unknown(&self) -> bool {
        self.file == UNKNOWN && self.function == UNKNOWN
    }
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({:?}, {}, {:?}, {:?})",
            self.file, self.line, self.function, self.source
        )
    }
}
