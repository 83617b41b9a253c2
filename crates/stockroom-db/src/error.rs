//! # Store Errors
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    From SQLite to the caller                            │
//! │                                                                         │
//! │  sqlx::Error                                                           │
//! │       │  classify(): message text + primary result code                │
//! │       ▼                                                                 │
//! │  DbError                                                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CoreError ← What borrow / return / checkout report                    │
//! │       ├── NotFound          (DbError::NotFound)                        │
//! │       ├── InvalidArgument   (DbError::UniqueViolation → Duplicate)     │
//! │       ├── InconsistentState (DbError::ConstraintViolation)             │
//! │       └── StoreUnavailable  (everything else, retryable)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use stockroom_core::{CoreError, ValidationError};
use thiserror::Error;

/// Failures of the SQLite store.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A UNIQUE index rejected the row (member emails).
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// A row points at a missing parent, or a parent still has children
    /// (a product named by past order lines).
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Another connection kept the write lock past `busy_timeout`.
    #[error("Database busy: {0}")]
    Busy(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// A CHECK or NOT NULL constraint, or a trigger `RAISE(ABORT)`, refused
    /// the row. The data is wrong; resubmitting it fails the same way.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Statement failed for another reason (bad SQL, I/O).
    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// No pooled connection freed up within `acquire_timeout`.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Whether the same statement may succeed if issued again later.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DbError::Busy(_) | DbError::PoolExhausted | DbError::TransactionFailed(_)
        )
    }
}

/// Primary result codes for lock contention.
const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;
const SQLITE_CONSTRAINT: i32 = 19;

/// Sorts an error reported by SQLite itself.
fn classify(db_err: &dyn sqlx::error::DatabaseError) -> DbError {
    let msg = db_err.message();

    // Extended codes keep the primary code in the low byte
    // (517 is SQLITE_BUSY_SNAPSHOT).
    let primary = db_err
        .code()
        .and_then(|code| code.parse::<i32>().ok())
        .map(|code| code & 0xff);

    if let Some(target) = msg.strip_prefix("UNIQUE constraint failed: ") {
        return DbError::UniqueViolation {
            field: target.to_string(),
            value: "unknown".to_string(),
        };
    }
    if msg.contains("FOREIGN KEY constraint failed") {
        return DbError::ForeignKeyViolation {
            message: msg.to_string(),
        };
    }
    match primary {
        Some(SQLITE_BUSY | SQLITE_LOCKED) => DbError::Busy(msg.to_string()),
        Some(SQLITE_CONSTRAINT) => DbError::ConstraintViolation(msg.to_string()),
        _ if msg.contains("database is locked") => DbError::Busy(msg.to_string()),
        _ => DbError::QueryFailed(msg.to_string()),
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),
            sqlx::Error::Database(db_err) => classify(db_err.as_ref()),
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),
            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Folds store failures into the domain taxonomy.
///
/// Only missing rows and duplicates describe the request itself; every
/// other store failure is reported as `StoreUnavailable` so the caller can
/// decide whether to resubmit.
impl From<DbError> for CoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => CoreError::NotFound { entity, id },
            DbError::UniqueViolation { field, value } => {
                CoreError::InvalidArgument(ValidationError::Duplicate { field, value })
            }
            DbError::ConstraintViolation(msg) => CoreError::InconsistentState(msg),
            other => CoreError::StoreUnavailable(other.to_string()),
        }
    }
}

/// Lets repository code use `?` on raw sqlx calls inside `CoreResult`
/// functions.
pub(crate) fn store_err(err: sqlx::Error) -> CoreError {
    DbError::from(err).into()
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;
