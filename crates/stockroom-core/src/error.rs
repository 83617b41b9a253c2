//! # Errors
//!
//! [`CoreError`] is what borrow, return, cart edits and checkout report.
//! [`ValidationError`] is the detail carried by `InvalidArgument`. The
//! store crate folds its own `DbError` into `CoreError` at the boundary.
//!
//! Every failure is scoped to one request. Nothing here is retried inside the
//! core; [`CoreError::is_retryable`] tells the caller which ones it may retry.

use thiserror::Error;

/// Failures reported by the reservation, cart and checkout operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Every copy of the book is already lent out. Nothing was written.
    #[error("No copies of book {book_id} available (all {copies} on loan)")]
    CapacityExceeded { book_id: i64, copies: i64 },

    /// The loan already has a return date.
    #[error("Loan {loan_id} has already been returned")]
    AlreadyReturned { loan_id: i64 },

    /// Checkout was attempted with no cart lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// Malformed quantity, id, name, or duration.
    #[error("Invalid argument: {0}")]
    InvalidArgument(#[from] ValidationError),

    /// The catalog changed underneath a cart (product removed before checkout).
    #[error("Inconsistent state: {0}")]
    InconsistentState(String),

    /// The transaction layer failed (lock timeout, conflict, closed pool).
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

impl CoreError {
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Whether resubmitting the same request may succeed.
    ///
    /// Only store failures qualify; every other variant describes the data
    /// and will fail again unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::StoreUnavailable(_))
    }
}

/// Why an argument was rejected.
///
/// Raised before any store access so malformed requests never open a
/// transaction.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Empty after trimming.
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Only member emails are unique.
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },

    /// A cart already holds `MAX_CART_LINES` products.
    #[error("{field} cannot hold more than {max} entries")]
    TooMany { field: String, max: usize },
}

pub type CoreResult<T> = Result<T, CoreError>;
