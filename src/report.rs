// Offline aggregation of a profiler log by call origin, and the text report.
// One batch pass: every line must decode, or the whole run fails.

use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};

use crate::codec::{self, CodecError};
use crate::models::{LogRecord, StackFrame};

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("line {line}: malformed record: {source}")]
    Malformed {
        line: usize,
        #[source]
        source: CodecError,
    },
    #[error("line {line}: record has an empty call stack")]
    EmptyStack { line: usize },
    #[error("read log: {0}")]
    Io(#[from] io::Error),
}

/// Totals for one origin. `sample_sql` is the SQL of the most recent record seen.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginBucket {
    pub origin: StackFrame,
    pub total_secs: f64,
    pub count: u64,
    pub sample_sql: String,
}

#[derive(Debug, Default)]
pub struct OriginAggregator {
    buckets: BTreeMap<StackFrame, OriginBucket>,
    records: u64,
}

impl OriginAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one record into its origin's bucket. Returns the record back if it has no frames.
    pub fn add(&mut self, record: LogRecord) -> Result<(), LogRecord> {
        let Some(origin) = record.stack.last() else {
            return Err(record);
        };
        match self.buckets.get_mut(origin) {
            Some(bucket) => {
                bucket.total_secs += record.duration_secs;
                bucket.count += 1;
                bucket.sample_sql = record.sql;
            }
            None => {
                let origin = origin.clone();
                self.buckets.insert(
                    origin.clone(),
                    OriginBucket {
                        origin,
                        total_secs: record.duration_secs,
                        count: 1,
                        sample_sql: record.sql,
                    },
                );
            }
        }
        self.records += 1;
        Ok(())
    }

    pub fn records(&self) -> u64 {
        self.records
    }

    pub fn origins(&self) -> usize {
        self.buckets.len()
    }

    /// Buckets by ascending total time (slowest last); ties keep origin order.
    pub fn finish(self) -> Vec<OriginBucket> {
        let mut out: Vec<OriginBucket> = self.buckets.into_values().collect();
        out.sort_by(|a, b| a.total_secs.total_cmp(&b.total_secs));
        out
    }
}

/// Decode and aggregate every line of `reader`.
pub fn aggregate_lines<R: BufRead>(reader: R) -> Result<Vec<OriginBucket>, ReportError> {
    let mut aggregator = OriginAggregator::new();
    for (idx, line) in reader.lines().enumerate() {
        let lno = idx + 1;
        let line = line?;
        let record = codec::decode_line(&line)
            .map_err(|source| ReportError::Malformed { line: lno, source })?;
        aggregator
            .add(record)
            .map_err(|_| ReportError::EmptyStack { line: lno })?;
    }
    tracing::debug!(
        records = aggregator.records(),
        origins = aggregator.origins(),
        "sql log aggregated"
    );
    Ok(aggregator.finish())
}

/// Aggregate already-decoded records. Record numbers in errors are 1-based.
pub fn aggregate_records<I>(records: I) -> Result<Vec<OriginBucket>, ReportError>
where
    I: IntoIterator<Item = LogRecord>,
{
    let mut aggregator = OriginAggregator::new();
    for (idx, record) in records.into_iter().enumerate() {
        aggregator
            .add(record)
            .map_err(|_| ReportError::EmptyStack { line: idx + 1 })?;
    }
    Ok(aggregator.finish())
}

/// Write one block per bucket; each block is followed by a blank line.
pub fn write_report<W: Write>(out: &mut W, buckets: &[OriginBucket]) -> io::Result<()> {
    for bucket in buckets {
        writeln!(
            out,
            "Trace: {}\nTime: {:.5}\nCount: {}\nSample query: {}\n",
            bucket.origin, bucket.total_secs, bucket.count, bucket.sample_sql
        )?;
    }
    Ok(())
}

pub fn render_report(buckets: &[OriginBucket]) -> String {
    let mut out = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = write_report(&mut out, buckets);
    String::from_utf8_lossy(&out).into_owned()
}
