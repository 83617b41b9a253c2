//! # Database Migrations
//!
//! Embedded SQL migrations for Stockroom.
//!
//! ## Schema Ownership
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Migration Set                                      │
//! │                                                                         │
//! │  001_initial_schema.sql                                                │
//! │       ├── books, members, loans        (lending ledger)                │
//! │       │     └── trg_loans_return_once  (return date written once)      │
//! │       └── products, orders, order_lines                                │
//! │             └── trg_order_lines_immutable_*                            │
//! │                                                                         │
//! │  002_session_carts.sql                                                 │
//! │       └── carts, cart_lines            (persistent session carts)      │
//! │                                                                         │
//! │  Applied in filename order, recorded in _sqlx_migrations.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! New migrations get the next sequence number. Applied files are never
//! edited; sqlx rejects a checksum mismatch on startup.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

/// Embedded migrations from the workspace `migrations/sqlite` directory.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Runs all pending database migrations.
///
/// Idempotent. Each migration runs in its own transaction.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    info!(
        embedded = MIGRATOR.migrations.len(),
        "Checking for pending migrations"
    );

    MIGRATOR.run(pool).await?;

    info!("All migrations applied successfully");
    Ok(())
}

/// Returns `(total_migrations, applied_migrations)`.
///
/// For diagnostics and health checks. A fresh database with no migration
/// table reports zero applied.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await
        .unwrap_or(0);

    Ok((total, applied as usize))
}
