//! # Loan Repository
//!
//! The borrow / return state machine. At any instant a book has at most
//! `copies` loans whose `return_date` is NULL, however many requests race.
//!
//! ## Borrow Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    borrow(book, member, days)                           │
//! │                                                                         │
//! │  validate days (1..=365)                                               │
//! │       │                                                                 │
//! │  BEGIN                                                                  │
//! │       │                                                                 │
//! │  UPDATE books SET copies = copies WHERE id = ?  ← claims the book row  │
//! │       │   0 rows → NotFound(Book), ROLLBACK       and the write lock   │
//! │       │                                           before any read      │
//! │  SELECT copies, member exists, COUNT(active loans)                     │
//! │       │   no member        → NotFound(Member), ROLLBACK                │
//! │       │   active >= copies → CapacityExceeded, ROLLBACK                │
//! │       │                                                                 │
//! │  INSERT INTO loans (…, return_date NULL)                               │
//! │       │                                                                 │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Two borrowers of the last copy: the second blocks on the first        │
//! │  UPDATE until the first commits, then counts the new loan and is       │
//! │  refused. Waiting longer than busy_timeout → StoreUnavailable.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Return
//! A single conditional update (`WHERE return_date IS NULL`). When it
//! touches no row, a lookup decides between `NotFound` and
//! `AlreadyReturned`. The first return date is never overwritten.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::error::{store_err, DbResult};
use stockroom_core::loan::{ensure_capacity, LoanWindow};
use stockroom_core::validation::validate_id;
use stockroom_core::{CoreError, CoreResult, Loan, LoanDetails, DEFAULT_LOAN_DAYS};

const LOAN_COLUMNS: &str = "id, book_id, member_id, loan_date, due_date, return_date";

/// Repository for loans: borrowing, returning and loan history.
#[derive(Debug, Clone)]
pub struct LoanRepository {
    pool: SqlitePool,
    default_loan_days: i64,
}

impl LoanRepository {
    /// Creates a new LoanRepository with the standard loan length.
    pub fn new(pool: SqlitePool) -> Self {
        LoanRepository {
            pool,
            default_loan_days: DEFAULT_LOAN_DAYS,
        }
    }

    /// Overrides the loan length used when `borrow` is given no duration.
    pub fn with_default_loan_days(mut self, days: i64) -> Self {
        self.default_loan_days = days;
        self
    }

    /// Lends one copy of a book to a member.
    ///
    /// ## Arguments
    /// * `duration_days` - Loan length; `None` uses the repository default
    ///
    /// ## Returns
    /// * `Ok(Loan)` - The new active loan
    /// * `Err(NotFound)` - Unknown book or member
    /// * `Err(CapacityExceeded)` - Every copy is out
    /// * `Err(InvalidArgument)` - Duration outside `1..=365`
    /// * `Err(StoreUnavailable)` - Lock wait timed out or the store failed
    pub async fn borrow(
        &self,
        book_id: i64,
        member_id: i64,
        duration_days: Option<i64>,
    ) -> CoreResult<Loan> {
        let days = duration_days.unwrap_or(self.default_loan_days);
        let window = LoanWindow::starting(Utc::now(), days)?;
        validate_id("book_id", book_id)?;
        validate_id("member_id", member_id)?;

        debug!(book_id, member_id, days, "Borrowing book");

        let mut tx = self.pool.begin().await.map_err(store_err)?;

        let claimed = sqlx::query("UPDATE books SET copies = copies WHERE id = ?1")
            .bind(book_id)
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;

        if claimed.rows_affected() == 0 {
            tx.rollback().await.map_err(store_err)?;
            return Err(CoreError::not_found("Book", book_id));
        }

        let (copies, member_exists, active): (i64, bool, i64) = sqlx::query_as(
            r#"
            SELECT
                b.copies,
                EXISTS (SELECT 1 FROM members m WHERE m.id = ?2),
                (SELECT COUNT(*) FROM loans l
                 WHERE l.book_id = b.id AND l.return_date IS NULL)
            FROM books b
            WHERE b.id = ?1
            "#,
        )
        .bind(book_id)
        .bind(member_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(store_err)?;

        if !member_exists {
            tx.rollback().await.map_err(store_err)?;
            return Err(CoreError::not_found("Member", member_id));
        }

        if let Err(err) = ensure_capacity(book_id, copies, active) {
            warn!(book_id, member_id, copies, active, "Borrow refused: no copy available");
            tx.rollback().await.map_err(store_err)?;
            return Err(err);
        }

        let loan = sqlx::query_as::<_, Loan>(&format!(
            r#"
            INSERT INTO loans (book_id, member_id, loan_date, due_date, return_date)
            VALUES (?1, ?2, ?3, ?4, NULL)
            RETURNING {LOAN_COLUMNS}
            "#
        ))
        .bind(book_id)
        .bind(member_id)
        .bind(window.loan_date)
        .bind(window.due_date)
        .fetch_one(&mut *tx)
        .await
        .map_err(store_err)?;

        tx.commit().await.map_err(store_err)?;

        info!(
            loan_id = loan.id,
            book_id,
            member_id,
            due = %loan.due_date,
            "Loan recorded"
        );
        Ok(loan)
    }

    /// Marks a loan as returned now.
    ///
    /// ## Returns
    /// * `Ok(Loan)` - The loan with its return date set
    /// * `Err(NotFound)` - No such loan
    /// * `Err(AlreadyReturned)` - Returned earlier; its date is left as is
    pub async fn return_loan(&self, loan_id: i64) -> CoreResult<Loan> {
        debug!(loan_id, "Returning loan");

        let returned = sqlx::query_as::<_, Loan>(&format!(
            r#"
            UPDATE loans SET return_date = ?1
            WHERE id = ?2 AND return_date IS NULL
            RETURNING {LOAN_COLUMNS}
            "#
        ))
        .bind(Utc::now())
        .bind(loan_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        if let Some(loan) = returned {
            info!(loan_id, book_id = loan.book_id, "Loan returned");
            return Ok(loan);
        }

        match self.get_by_id(loan_id).await? {
            None => Err(CoreError::not_found("Loan", loan_id)),
            Some(_) => {
                warn!(loan_id, "Return refused: loan already returned");
                Err(CoreError::AlreadyReturned { loan_id })
            }
        }
    }

    /// Gets a loan by ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Loan>> {
        let loan = sqlx::query_as::<_, Loan>(&format!(
            "SELECT {LOAN_COLUMNS} FROM loans WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(loan)
    }

    /// All loans, newest first, with book title and member contact.
    pub async fn list_details(&self) -> DbResult<Vec<LoanDetails>> {
        let loans = sqlx::query_as::<_, LoanDetails>(
            r#"
            SELECT
                l.id,
                l.book_id,
                b.title AS book_title,
                l.member_id,
                m.name AS member_name,
                m.email AS member_email,
                l.loan_date,
                l.due_date,
                l.return_date
            FROM loans l
            INNER JOIN books b ON b.id = l.book_id
            INNER JOIN members m ON m.id = l.member_id
            ORDER BY l.loan_date DESC, l.id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = loans.len(), "Listed loans");
        Ok(loans)
    }

    /// Outstanding loans of one member, soonest due first.
    pub async fn active_for_member(&self, member_id: i64) -> DbResult<Vec<Loan>> {
        let loans = sqlx::query_as::<_, Loan>(&format!(
            r#"
            SELECT {LOAN_COLUMNS} FROM loans
            WHERE member_id = ?1 AND return_date IS NULL
            ORDER BY due_date, id
            "#
        ))
        .bind(member_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(loans)
    }

    /// Number of active loans of a book.
    pub async fn active_count(&self, book_id: i64) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM loans WHERE book_id = ?1 AND return_date IS NULL",
        )
        .bind(book_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
