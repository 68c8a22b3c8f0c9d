// ProfiledCursor: delegation, timing/logging discipline, error precedence, passthrough

mod common;

use common::MockCursor;
use sqlprof::cursor::{Cursor, DbError, ProfiledCursor};
use sqlprof::models::{Row, Value};
use tempfile::TempDir;

fn scripted_rows() -> Vec<Row> {
    vec![
        vec![Value::Integer(1), Value::Text("first".into())],
        vec![Value::Integer(2), Value::Text("second".into())],
        vec![Value::Integer(3), Value::Null],
    ]
}

#[tokio::test]
async fn execute_returns_inner_result_and_logs_substituted_sql() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sql.log");
    let mut cursor = ProfiledCursor::new(MockCursor::default(), common::always_profiler(&path));

    let params = vec![Value::Integer(7), Value::Text("x".into())];
    let affected = cursor
        .execute("UPDATE polls SET votes = ? WHERE name = ?", &params)
        .await
        .unwrap();

    assert_eq!(affected, 1);
    assert_eq!(cursor.inner().executed.len(), 1);
    assert_eq!(cursor.inner().executed[0].1, params);

    let records = common::read_log(&path);
    assert_eq!(records.len(), 1);
    assert_eq!(
        records[0].sql,
        cursor
            .inner()
            .last_executed_query("UPDATE polls SET votes = ? WHERE name = ?", &params)
    );
    assert!(records[0].duration_secs >= 0.0);
}

#[tokio::test]
async fn execute_error_propagates_and_is_still_logged() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sql.log");
    let profiler = common::always_profiler(&path);
    let mut cursor = ProfiledCursor::new(MockCursor::failing("no such table: polls"), profiler.clone());

    let err = cursor.execute("SELECT * FROM polls", &[]).await.unwrap_err();

    match err {
        DbError::Driver(message) => assert_eq!(message, "no such table: polls"),
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(common::read_log(&path).len(), 1);
    assert_eq!(profiler.stats().logged, 1);
}

#[tokio::test]
async fn execute_error_wins_over_logging_failure() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("no-such-dir").join("sql.log");
    let profiler = common::always_profiler(&path);
    let mut cursor = ProfiledCursor::new(MockCursor::failing("disk I/O error"), profiler.clone());

    let err = cursor.execute("DELETE FROM polls", &[]).await.unwrap_err();

    assert!(matches!(err, DbError::Driver(ref m) if m == "disk I/O error"));
    assert_eq!(profiler.stats().failed, 1);
}

#[tokio::test]
async fn logging_failure_does_not_change_success() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("no-such-dir").join("sql.log");
    let mut cursor = ProfiledCursor::new(MockCursor::default(), common::always_profiler(&path));

    assert_eq!(cursor.execute("INSERT INTO t VALUES (1)", &[]).await.unwrap(), 1);
    assert_eq!(cursor.row_count(), Some(1));
}

#[tokio::test]
async fn execute_many_logs_template_not_rows() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sql.log");
    let mut cursor = ProfiledCursor::new(MockCursor::default(), common::always_profiler(&path));

    let template = "INSERT INTO comments (poll_id, text) VALUES (?, ?)";
    let rows = vec![
        vec![Value::Integer(1), Value::Text("a".into())],
        vec![Value::Integer(2), Value::Text("b".into())],
        vec![Value::Integer(3), Value::Text("c".into())],
    ];
    assert_eq!(cursor.execute_many(template, &rows).await.unwrap(), 3);

    let records = common::read_log(&path);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].sql, template);
    assert_eq!(cursor.inner().executed_many, vec![(template.to_string(), 3)]);
}

#[tokio::test]
async fn execute_many_error_propagates() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sql.log");
    let mut cursor = ProfiledCursor::new(MockCursor::failing("constraint failed"), common::always_profiler(&path));

    let err = cursor
        .execute_many("INSERT INTO t VALUES (?)", &[vec![Value::Integer(1)]])
        .await
        .unwrap_err();

    assert!(matches!(err, DbError::Driver(_)));
    assert_eq!(common::read_log(&path)[0].sql, "INSERT INTO t VALUES (?)");
}

#[tokio::test]
async fn unsampled_cursor_writes_no_log() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sql.log");
    let mut cursor = ProfiledCursor::new(MockCursor::default(), common::never_profiler(&path));

    for _ in 0..10 {
        cursor.execute("SELECT 1", &[]).await.unwrap();
    }

    assert!(!path.exists());
}

#[tokio::test]
async fn non_intercepted_operations_match_raw_cursor() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sql.log");
    let columns = ["id", "text"];

    let mut raw = MockCursor::with_rows(&columns, scripted_rows());
    let mut wrapped = ProfiledCursor::new(
        MockCursor::with_rows(&columns, scripted_rows()),
        common::always_profiler(&path),
    );

    raw.execute("SELECT id, text FROM comments", &[]).await.unwrap();
    wrapped.execute("SELECT id, text FROM comments", &[]).await.unwrap();

    assert_eq!(raw.description(), wrapped.description());
    assert_eq!(raw.row_count(), wrapped.row_count());
    assert_eq!(raw.last_insert_id(), wrapped.last_insert_id());
    assert_eq!(raw.fetch_one(), wrapped.fetch_one());
    assert_eq!(raw.fetch_many(1), wrapped.fetch_many(1));
    assert_eq!(raw.fetch_all(), wrapped.fetch_all());
    assert_eq!(raw.fetch_one(), None);
    assert_eq!(wrapped.fetch_one(), None);

    raw.execute("SELECT id, text FROM comments", &[]).await.unwrap();
    wrapped.execute("SELECT id, text FROM comments", &[]).await.unwrap();
    let raw_rows: Vec<Row> = raw.rows().collect();
    let wrapped_rows: Vec<Row> = wrapped.rows().collect();
    assert_eq!(raw_rows, scripted_rows());
    assert_eq!(raw_rows, wrapped_rows);

    assert_eq!(
        raw.last_executed_query("SELECT ?", &[Value::Integer(1)]),
        wrapped.last_executed_query("SELECT ?", &[Value::Integer(1)])
    );

    wrapped.close();
    assert!(wrapped.inner().closed);
}
