//! # Loan Rules
//!
//! The arithmetic behind borrowing: when a loan is due and whether a book
//! has a free copy. The ledger runs these inside its borrow transaction.

use chrono::{DateTime, Duration, Utc};

use crate::error::{CoreError, CoreResult};
use crate::validation::validate_loan_days;

/// Loan and due date of a new loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoanWindow {
    pub loan_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
}

impl LoanWindow {
    /// A window opening at `now` and lasting `days` whole days.
    ///
    /// ## Errors
    /// `InvalidArgument` unless `1 <= days <= MAX_LOAN_DAYS`.
    ///
    /// ## Example
    /// ```rust
    /// use chrono::{Duration, Utc};
    /// use stockroom_core::loan::LoanWindow;
    ///
    /// let now = Utc::now();
    /// let window = LoanWindow::starting(now, 14).unwrap();
    /// assert_eq!(window.due_date - window.loan_date, Duration::days(14));
    /// ```
    pub fn starting(now: DateTime<Utc>, days: i64) -> CoreResult<Self> {
        validate_loan_days(days)?;

        Ok(LoanWindow {
            loan_date: now,
            due_date: now + Duration::days(days),
        })
    }
}

/// Copies still lendable. Never negative, even if the data were corrupt.
#[inline]
pub fn available_copies(copies: i64, active_loans: i64) -> i64 {
    (copies - active_loans).max(0)
}

/// Admits one more loan of `book_id` or reports `CapacityExceeded`.
pub fn ensure_capacity(book_id: i64, copies: i64, active_loans: i64) -> CoreResult<()> {
    if active_loans >= copies {
        return Err(CoreError::CapacityExceeded { book_id, copies });
    }

    Ok(())
}
