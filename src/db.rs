// SQLite database handle and the profiler hook.
// `cursor()` hands out raw driver cursors, or profiled ones while a profiler is registered.
// The hook is revocable: unregistering affects cursors created afterwards.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use crate::config::ProfilerConfig;
use crate::cursor::{Cursor, DbError, ProfiledCursor, SqliteCursor};
use crate::models::{Row, Value};
use crate::profiler::Profiler;

pub struct Database {
    pool: SqlitePool,
    profiler: RwLock<Option<Arc<Profiler>>>,
}

impl Database {
    /// Connect to SQLite at `path`, create parent dir and DB if missing, enable WAL + pragmas.
    pub async fn connect(path: &str, max_pool_size: u32) -> Result<Self, DbError> {
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5))
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_pool_size.max(1))
            .connect_with(opts)
            .await?;
        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self {
            pool,
            profiler: RwLock::new(None),
        }
    }

    /// New cursor on a pooled connection, wrapped when a profiler is registered.
    pub async fn cursor(&self) -> Result<DbCursor, DbError> {
        let raw = SqliteCursor::new(self.pool.acquire().await?);
        let cursor = match self.profiler.read().await.as_ref() {
            Some(profiler) => DbCursor::Profiled(ProfiledCursor::new(raw, profiler.clone())),
            None => DbCursor::Raw(raw),
        };
        Ok(cursor)
    }

    /// Install `profiler` for new cursors. Returns the one it replaces, if any.
    pub async fn register_profiler(&self, profiler: Arc<Profiler>) -> Option<Arc<Profiler>> {
        self.profiler.write().await.replace(profiler)
    }

    /// Remove the profiler; new cursors are raw again.
    pub async fn unregister_profiler(&self) -> Option<Arc<Profiler>> {
        self.profiler.write().await.take()
    }

    pub async fn profiler(&self) -> Option<Arc<Profiler>> {
        self.profiler.read().await.clone()
    }

    pub async fn is_profiling(&self) -> bool {
        self.profiler.read().await.is_some()
    }

    /// Register a profiler when both the log path and the frequency are configured.
    /// Returns whether profiling is now active; never fails.
    #[instrument(skip(self, config), fields(operation = "install_profiler"))]
    pub async fn install_from_config(&self, config: &ProfilerConfig) -> bool {
        let Some(settings) = config.sampling() else {
            debug!("sql profiler: log path or frequency not configured; profiling off");
            return false;
        };
        let profiler = Arc::new(Profiler::new(&settings));
        self.register_profiler(profiler).await;
        info!(
            log_path = %settings.log_path.display(),
            frequency = settings.frequency,
            "sql profiler enabled"
        );
        true
    }

    /// Load-time activation: read config (file + env) and install. Any failure leaves profiling off.
    pub async fn install_from_env(&self) -> bool {
        match ProfilerConfig::load() {
            Ok(config) => self.install_from_config(&config).await,
            Err(e) => {
                debug!(error = %e, "sql profiler: config unavailable; profiling off");
                false
            }
        }
    }
}

/// Cursor handed out by `Database`: the driver cursor, with or without profiling.
pub enum DbCursor {
    Raw(SqliteCursor),
    Profiled(ProfiledCursor<SqliteCursor>),
}

impl DbCursor {
    pub fn is_profiled(&self) -> bool {
        matches!(self, DbCursor::Profiled(_))
    }
}

impl Cursor for DbCursor {
    async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64, DbError> {
        match self {
            DbCursor::Raw(c) => c.execute(sql, params).await,
            DbCursor::Profiled(c) => c.execute(sql, params).await,
        }
    }

    async fn execute_many(&mut self, sql: &str, param_list: &[Vec<Value>]) -> Result<u64, DbError> {
        match self {
            DbCursor::Raw(c) => c.execute_many(sql, param_list).await,
            DbCursor::Profiled(c) => c.execute_many(sql, param_list).await,
        }
    }

    fn fetch_one(&mut self) -> Option<Row> {
        match self {
            DbCursor::Raw(c) => c.fetch_one(),
            DbCursor::Profiled(c) => c.fetch_one(),
        }
    }

    fn fetch_many(&mut self, size: usize) -> Vec<Row> {
        match self {
            DbCursor::Raw(c) => c.fetch_many(size),
            DbCursor::Profiled(c) => c.fetch_many(size),
        }
    }

    fn fetch_all(&mut self) -> Vec<Row> {
        match self {
            DbCursor::Raw(c) => c.fetch_all(),
            DbCursor::Profiled(c) => c.fetch_all(),
        }
    }

    fn row_count(&self) -> Option<u64> {
        match self {
            DbCursor::Raw(c) => c.row_count(),
            DbCursor::Profiled(c) => c.row_count(),
        }
    }

    fn last_insert_id(&self) -> Option<i64> {
        match self {
            DbCursor::Raw(c) => c.last_insert_id(),
            DbCursor::Profiled(c) => c.last_insert_id(),
        }
    }

    fn description(&self) -> &[String] {
        match self {
            DbCursor::Raw(c) => c.description(),
            DbCursor::Profiled(c) => c.description(),
        }
    }

    fn last_executed_query(&self, sql: &str, params: &[Value]) -> String {
        match self {
            DbCursor::Raw(c) => c.last_executed_query(sql, params),
            DbCursor::Profiled(c) => c.last_executed_query(sql, params),
        }
    }

    fn close(&mut self) {
        match self {
            DbCursor::Raw(c) => c.close(),
            DbCursor::Profiled(c) => c.close(),
        }
    }
}
