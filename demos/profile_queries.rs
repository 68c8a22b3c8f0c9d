// Run a small workload against a scratch SQLite database with profiling switched on,
// then print the aggregated report for the log it produced.
//
// Usage: cargo run --example profile_queries -- [LOG_PATH] [FREQ]
//   LOG_PATH  default: ./logs/sql.log
//   FREQ      default: 1.0

use sqlprof::config::ProfilerConfig;
use sqlprof::cursor::Cursor;
use sqlprof::db::Database;
use sqlprof::models::Value;
use sqlprof::report;
use std::env;

async fn list_comments(db: &Database, poll_id: i64) -> anyhow::Result<usize> {
    let mut cursor = db.cursor().await?;
    cursor
        .execute(
            "SELECT id, text FROM comments WHERE poll_id = ?",
            &[poll_id.into()],
        )
        .await?;
    Ok(cursor.rows().count())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    let log_path = args.get(1).cloned().unwrap_or_else(|| "./logs/sql.log".into());
    let freq = args.get(2).cloned().unwrap_or_else(|| "1.0".into());

    if let Some(parent) = std::path::Path::new(&log_path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    let scratch = tempfile::TempDir::new()?;
    let db_path = scratch.path().join("demo.db");
    let db = Database::connect(db_path.to_str().unwrap_or("demo.db"), 4).await?;

    let mut config = ProfilerConfig::default();
    config.apply_overrides(|key| match key {
        sqlprof::config::ENV_LOG_PATH => Some(log_path.clone()),
        sqlprof::config::ENV_LOG_FREQ => Some(freq.clone()),
        _ => None,
    })?;
    config.validate()?;
    db.install_from_config(&config).await;

    let mut cursor = db.cursor().await?;
    cursor
        .execute(
            "CREATE TABLE IF NOT EXISTS comments (id INTEGER PRIMARY KEY, poll_id INTEGER, text TEXT)",
            &[],
        )
        .await?;
    let rows: Vec<Vec<Value>> = (0..50)
        .map(|i: i64| vec![(i % 5).into(), format!("comment {}", i).into()])
        .collect();
    cursor
        .execute_many("INSERT INTO comments (poll_id, text) VALUES (?, ?)", &rows)
        .await?;

    for poll_id in 0..5 {
        for _ in 0..20 {
            list_comments(&db, poll_id).await?;
        }
    }

    let file = std::fs::File::open(&log_path)?;
    let buckets = report::aggregate_lines(std::io::BufReader::new(file))?;
    print!("{}", report::render_report(&buckets));
    Ok(())
}
