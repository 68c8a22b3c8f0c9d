// Sampling profiler: decides per statement whether to log, captures the call site and
// appends one encoded record to the log. Nothing in the logging step reaches the caller.

mod sampler;
mod sink;
mod stack;

pub use sampler::Sampler;
pub use sink::LogSink;
pub use stack::{SourceCache, capture_stack};

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

use crate::codec::{self, CodecError};
use crate::config::SamplingSettings;
use crate::models::LogRecord;

#[derive(Debug, thiserror::Error)]
pub enum ProfilerError {
    #[error("encode record: {0}")]
    Codec(#[from] CodecError),
    #[error("append to {path}: {source}")]
    Append {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Counters since the profiler was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProfilerStats {
    /// Statements that reached the logging step.
    pub observed: u64,
    /// Records appended to the log.
    pub logged: u64,
    /// Sampled records dropped because encoding or the append failed.
    pub failed: u64,
}

#[derive(Debug)]
pub struct Profiler {
    sampler: Sampler,
    sink: LogSink,
    sources: SourceCache,
    observed: AtomicU64,
    logged: AtomicU64,
    failed: AtomicU64,
}

impl Profiler {
    pub fn new(settings: &SamplingSettings) -> Self {
        let sampler = match settings.seed {
            Some(seed) => Sampler::seeded(settings.frequency, seed),
            None => Sampler::new(settings.frequency),
        };
        Self::with_sampler(sampler, LogSink::new(&settings.log_path))
    }

    pub fn with_sampler(sampler: Sampler, sink: LogSink) -> Self {
        Self {
            sampler,
            sink,
            sources: SourceCache::default(),
            observed: AtomicU64::new(0),
            logged: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    pub fn log_path(&self) -> &Path {
        self.sink.path()
    }

    pub fn frequency(&self) -> f64 {
        self.sampler.frequency()
    }

    pub fn stats(&self) -> ProfilerStats {
        ProfilerStats {
            observed: self.observed.load(Ordering::Relaxed),
            logged: self.logged.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }

    /// Logging decision for a statement whose SQL text is already known.
    pub fn log_sql(&self, sql: &str, elapsed: Duration) {
        self.log_sql_with(|| sql.to_owned(), elapsed);
    }

    /// Logging decision step. `resolve_sql` runs only for sampled statements and inside the
    /// same failure boundary: errors and panics are counted, reported and swallowed.
    pub fn log_sql_with<F>(&self, resolve_sql: F, elapsed: Duration)
    where
        F: FnOnce() -> String,
    {
        self.observed.fetch_add(1, Ordering::Relaxed);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.try_log_sql(resolve_sql, elapsed)
        }));
        match outcome {
            Ok(Ok(true)) => {
                self.logged.fetch_add(1, Ordering::Relaxed);
            }
            Ok(Ok(false)) => {}
            Ok(Err(e)) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                warn!(error = %e, "sql profiler: sampled record dropped");
            }
            Err(_) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                warn!("sql profiler: logging step panicked; sampled record dropped");
            }
        }
    }

    fn try_log_sql<F>(&self, resolve_sql: F, elapsed: Duration) -> Result<bool, ProfilerError>
    where
        F: FnOnce() -> String,
    {
        if !self.sampler.should_sample() {
            return Ok(false);
        }
        let stack = capture_stack(&self.sources);
        let record = LogRecord::new(elapsed, resolve_sql(), stack);
        let line = codec::encode_line(&record)?;
        self.sink
            .append(&line)
            .map_err(|source| ProfilerError::Append {
                path: self.sink.path().display().to_string(),
                source,
            })?;
        debug!(
            duration_secs = record.duration_secs,
            frames = record.stack.len(),
            "sql profiler: record appended"
        );
        Ok(true)
    }
}
