//! # Connection Pool
//!
//! Opening the SQLite database and handing out repositories.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Opening the store                                   │
//! │                                                                         │
//! │  DbConfig ──connect_options()──► journal WAL, synchronous NORMAL,      │
//! │      │                           foreign_keys ON, busy_timeout         │
//! │      ▼                                                                  │
//! │  Database::new ──► SqlitePool (min..max connections)                   │
//! │      │                                                                  │
//! │      └──► migrations::run_migrations (unless disabled)                 │
//! │                                                                         │
//! │  Writers and the lock                                                   │
//! │                                                                         │
//! │  conn 1: BEGIN; UPDATE books …  ──── holds write lock ──── COMMIT      │
//! │  conn 2: BEGIN; UPDATE books …  ┄┄ waits (busy_timeout) ┄┄► proceeds   │
//! │  conn 3: SELECT …               ── reads its WAL snapshot, never waits │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every check-then-act transaction in this crate opens with a write, so it
//! owns the lock before it reads the rows it decides on.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::cart_store::SqliteCartStore;
use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::book::BookRepository;
use crate::repository::loan::LoanRepository;
use crate::repository::member::MemberRepository;
use crate::repository::order::OrderRepository;
use crate::repository::product::ProductRepository;

const IN_MEMORY: &str = ":memory:";

// =============================================================================
// Configuration
// =============================================================================

/// How to open the database.
///
/// ```rust,ignore
/// let config = DbConfig::new("/var/lib/stockroom/stockroom.db")
///     .max_connections(8)
///     .busy_timeout(Duration::from_secs(2));
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Database file, created on first open.
    pub database_path: PathBuf,

    /// Pool ceiling. Default 5.
    pub max_connections: u32,

    /// Connections kept open while idle. Default 1.
    pub min_connections: u32,

    /// Wait for a free pooled connection. Default 30s.
    pub acquire_timeout: Duration,

    /// Idle connections are closed after this. Default 10 min; `None`
    /// keeps them.
    pub idle_timeout: Option<Duration>,

    /// Connections are replaced after this age. Default 30 min; `None`
    /// keeps them.
    pub max_lifetime: Option<Duration>,

    /// Wait for the SQLite write lock before giving up with
    /// `DbError::Busy`. Default 5s.
    pub busy_timeout: Duration,

    /// Apply pending migrations on open. Default true.
    pub run_migrations: bool,
}

impl DbConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)),
            max_lifetime: Some(Duration::from_secs(1800)),
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    /// A private database that lives as long as the pool.
    ///
    /// Each SQLite connection to `:memory:` sees its own database, so the
    /// pool is pinned to one connection that is never closed for age or
    /// idleness: replacing it would start an empty database. Used by the
    /// test suites.
    pub fn in_memory() -> Self {
        DbConfig {
            max_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            idle_timeout: None,
            max_lifetime: None,
            ..DbConfig::new(IN_MEMORY)
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == IN_MEMORY
    }

    /// Per-connection settings applied by the pool.
    pub fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let base = if self.is_in_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
        } else {
            SqliteConnectOptions::new()
                .filename(&self.database_path)
                .create_if_missing(true)
        };

        Ok(base
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            // Off by default in SQLite; loans and order lines rely on them.
            .foreign_keys(true)
            .busy_timeout(self.busy_timeout))
    }
}

// =============================================================================
// Database
// =============================================================================

/// Shared handle to the store. Clones share one pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the pool and, unless disabled, migrates the schema.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            max_connections = config.max_connections,
            busy_timeout_ms = config.busy_timeout.as_millis() as u64,
            "Opening database"
        );

        let options = config.connect_options()?;

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(config.idle_timeout)
            .max_lifetime(config.max_lifetime)
            .connect_with(options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        debug!("Pool ready");

        let db = Database { pool };
        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Applies pending migrations. Safe to call repeatedly.
    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    /// The raw pool, for queries no repository covers.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn books(&self) -> BookRepository {
        BookRepository::new(self.pool.clone())
    }

    pub fn members(&self) -> MemberRepository {
        MemberRepository::new(self.pool.clone())
    }

    /// Borrow and return.
    pub fn loans(&self) -> LoanRepository {
        LoanRepository::new(self.pool.clone())
    }

    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    pub fn orders(&self) -> OrderRepository {
        OrderRepository::new(self.pool.clone())
    }

    /// Session carts kept in the `carts` tables.
    pub fn carts(&self) -> SqliteCartStore {
        SqliteCartStore::new(self.pool.clone())
    }

    /// Closes every connection. Later queries fail with `ConnectionFailed`.
    pub async fn close(&self) {
        info!("Closing database");
        self.pool.close().await;
    }

    /// True when a trivial query round-trips.
    pub async fn health_check(&self) -> bool {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database_is_migrated() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        assert!(db.health_check().await);
        let (embedded, applied) = migrations::migration_status(db.pool()).await.unwrap();
        assert_eq!(embedded, applied);
        assert!(applied >= 2);
    }

    #[test]
    fn test_builder_and_in_memory_defaults() {
        let config = DbConfig::new("/tmp/stockroom.db")
            .max_connections(10)
            .min_connections(2)
            .busy_timeout(Duration::from_millis(250))
            .run_migrations(false);

        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
        assert_eq!(config.busy_timeout, Duration::from_millis(250));
        assert!(!config.run_migrations);
        assert!(!config.is_in_memory());

        assert_eq!(config.max_lifetime, Some(Duration::from_secs(1800)));

        let memory = DbConfig::in_memory();
        assert!(memory.is_in_memory());
        assert_eq!(memory.max_connections, 1);
        assert_eq!(memory.max_lifetime, None);
        assert_eq!(memory.idle_timeout, None);
        assert!(memory.run_migrations);
    }

    #[tokio::test]
    async fn test_foreign_keys_are_enforced() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let orphan = sqlx::query(
            "INSERT INTO loans (book_id, member_id, loan_date, due_date) VALUES (1, 1, 'x', 'y')",
        )
        .execute(db.pool())
        .await;
        assert!(matches!(
            orphan.map_err(DbError::from),
            Err(DbError::ForeignKeyViolation { .. })
        ));
    }

    #[tokio::test]
    async fn test_closed_pool_is_unhealthy() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.close().await;
        assert!(!db.health_check().await);
    }
}
