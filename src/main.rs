// sqlprof-analyse: read a profiler log on stdin, print per-origin totals on stdout.
//
// Usage: sqlprof-analyse < sql.log
//
// Origins are ordered by total time ascending, so the most expensive call site is last.
// Totals only cover sampled statements: at a frequency of 0.2 they are roughly 20% of
// the real count and time. Diagnostics go to stderr (RUST_LOG, default "warn").

use anyhow::{Context, Result};
use sqlprof::report;
use std::io::{self, BufWriter, Write};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        "reading sql log from stdin"
    );

    // The whole input is aggregated before anything is printed: a bad line yields no report.
    let buckets = report::aggregate_lines(io::stdin().lock()).context("analyse sql log")?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    report::write_report(&mut out, &buckets)?;
    out.flush()?;
    Ok(())
}
