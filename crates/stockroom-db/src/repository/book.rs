//! # Book Repository
//!
//! Lendable items and how many of their copies are on the shelf.
//!
//! ## Availability
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  available = copies − COUNT(loans WHERE book_id = ? AND                │
//! │                                   return_date IS NULL)                 │
//! │                                                                         │
//! │  "Dune"  copies 2 │ active loans 1 │ available 1                       │
//! │  "Emma"  copies 1 │ active loans 1 │ available 0                       │
//! │                                                                         │
//! │  Served by idx_loans_active_by_book (partial index on active loans).   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{store_err, DbResult};
use stockroom_core::loan::available_copies;
use stockroom_core::validation::{validate_copies, validate_name};
use stockroom_core::{Book, BookAvailability, CoreError, CoreResult};

const SELECT_AVAILABILITY: &str = r#"
    SELECT
        b.id,
        b.title,
        b.author,
        b.copies,
        MAX(b.copies - (
            SELECT COUNT(*) FROM loans l
            WHERE l.book_id = b.id AND l.return_date IS NULL
        ), 0) AS available
    FROM books b
"#;

/// Repository for books.
#[derive(Debug, Clone)]
pub struct BookRepository {
    pool: SqlitePool,
}

impl BookRepository {
    /// Creates a new BookRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BookRepository { pool }
    }

    /// Adds a book to the catalog.
    ///
    /// `copies` defaults to 1 when omitted and must be at least 1.
    pub async fn create(&self, title: &str, author: &str, copies: Option<i64>) -> CoreResult<Book> {
        let title = validate_name("title", title)?;
        let author = validate_name("author", author)?;
        let copies = copies.unwrap_or(1);
        validate_copies(copies)?;

        debug!(title = %title, copies, "Inserting book");

        let book = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, author, copies, created_at)
            VALUES (?1, ?2, ?3, ?4)
            RETURNING id, title, author, copies, created_at
            "#,
        )
        .bind(&title)
        .bind(&author)
        .bind(copies)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(book)
    }

    /// Gets a book by its ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(
            "SELECT id, title, author, copies, created_at FROM books WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(book)
    }

    /// Copies currently on the shelf: `copies − active loans`, never negative.
    ///
    /// ## Returns
    /// * `Err(CoreError::NotFound)` - No such book
    pub async fn availability(&self, book_id: i64) -> CoreResult<i64> {
        let row: Option<(i64, i64)> = sqlx::query_as(
            r#"
            SELECT
                b.copies,
                (SELECT COUNT(*) FROM loans l
                 WHERE l.book_id = b.id AND l.return_date IS NULL)
            FROM books b
            WHERE b.id = ?1
            "#,
        )
        .bind(book_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        let (copies, active) = row.ok_or_else(|| CoreError::not_found("Book", book_id))?;
        Ok(available_copies(copies, active))
    }

    /// Every book with its available count, ordered by title.
    pub async fn list_with_availability(&self) -> DbResult<Vec<BookAvailability>> {
        let sql = format!("{SELECT_AVAILABILITY} ORDER BY b.title, b.id");
        let books = sqlx::query_as::<_, BookAvailability>(&sql)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = books.len(), "Listed books");
        Ok(books)
    }

    /// Counts books (for diagnostics and the seeder).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{book, member, memory_db};
    use stockroom_core::ValidationError;

    #[tokio::test]
    async fn test_create_defaults_to_one_copy() {
        let db = memory_db().await;
        let created = db.books().create("Dune", "Frank Herbert", None).await.unwrap();

        assert_eq!(created.copies, 1);
        let fetched = db.books().get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_create_rejects_zero_copies_and_blank_title() {
        let db = memory_db().await;

        let err = db.books().create("Dune", "Herbert", Some(0)).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidArgument(ValidationError::MustBePositive { .. })
        ));

        let err = db.books().create("   ", "Herbert", None).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidArgument(ValidationError::Required { .. })
        ));
        assert_eq!(db.books().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_availability_tracks_active_loans() {
        let db = memory_db().await;
        let dune = book(&db, "Dune", 2).await;
        let ann = member(&db, "Ann").await;

        assert_eq!(db.books().availability(dune.id).await.unwrap(), 2);

        let loan = db.loans().borrow(dune.id, ann.id, None).await.unwrap();
        assert_eq!(db.books().availability(dune.id).await.unwrap(), 1);

        db.loans().return_loan(loan.id).await.unwrap();
        assert_eq!(db.books().availability(dune.id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_availability_unknown_book() {
        let db = memory_db().await;
        let err = db.books().availability(404).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_list_with_availability() {
        let db = memory_db().await;
        let emma = book(&db, "Emma", 1).await;
        book(&db, "Dune", 3).await;
        let ann = member(&db, "Ann").await;
        db.loans().borrow(emma.id, ann.id, None).await.unwrap();

        let listed = db.books().list_with_availability().await.unwrap();
        let summary: Vec<(&str, i64, i64)> = listed
            .iter()
            .map(|b| (b.title.as_str(), b.copies, b.available))
            .collect();
        assert_eq!(summary, vec![("Dune", 3, 3), ("Emma", 1, 0)]);
    }
}
