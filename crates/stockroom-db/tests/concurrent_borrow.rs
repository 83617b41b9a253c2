//! Concurrent access tests for the loan ledger.
//!
//! A file-backed database with a multi-connection pool, so borrowers really
//! do run on separate SQLite connections. Every task waits on a barrier and
//! then fires at once. The last test holds the write lock open itself to
//! check what a borrower sees when its wait runs out.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use stockroom_core::CoreError;
use stockroom_db::{Database, DbConfig};
use tokio::sync::Barrier;
use uuid::Uuid;

struct TempDb {
    db: Database,
    path: PathBuf,
}

impl TempDb {
    async fn open() -> Self {
        Self::open_with(Duration::from_secs(30)).await
    }

    async fn open_with(busy_timeout: Duration) -> Self {
        let path = std::env::temp_dir().join(format!("stockroom-test-{}.db", Uuid::new_v4()));
        let config = DbConfig::new(&path)
            .max_connections(8)
            .busy_timeout(busy_timeout);
        let db = Database::new(config).await.unwrap();
        TempDb { db, path }
    }

    async fn cleanup(self) {
        self.db.close().await;
        for suffix in ["", "-wal", "-shm"] {
            let mut file = self.path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }
}

async fn race_for_book(db: &Database, copies: i64, borrowers: usize) -> (usize, usize) {
    let book = db
        .books()
        .create("Solaris", "Stanislaw Lem", Some(copies))
        .await
        .unwrap();

    let mut member_ids = Vec::with_capacity(borrowers);
    for n in 0..borrowers {
        let member = db
            .members()
            .create(&format!("Reader {n}"), &format!("reader{n}@example.com"))
            .await
            .unwrap();
        member_ids.push(member.id);
    }

    let barrier = Arc::new(Barrier::new(borrowers));
    let mut handles = Vec::with_capacity(borrowers);
    for member_id in member_ids {
        let loans = db.loans();
        let barrier = Arc::clone(&barrier);
        let book_id = book.id;
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            loans.borrow(book_id, member_id, None).await
        }));
    }

    let mut granted = 0;
    let mut refused = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => granted += 1,
            Err(CoreError::CapacityExceeded { .. }) => refused += 1,
            Err(other) => panic!("unexpected borrow error: {other:?}"),
        }
    }

    assert_eq!(db.loans().active_count(book.id).await.unwrap(), granted as i64);
    assert_eq!(db.books().availability(book.id).await.unwrap(), copies - granted as i64);
    (granted, refused)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_single_copy_is_lent_once() {
    let temp = TempDb::open().await;

    let (granted, refused) = race_for_book(&temp.db, 1, 16).await;
    assert_eq!(granted, 1);
    assert_eq!(refused, 15);

    temp.cleanup().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_capacity_caps_concurrent_loans() {
    let temp = TempDb::open().await;

    let (granted, refused) = race_for_book(&temp.db, 3, 12).await;
    assert_eq!(granted, 3);
    assert_eq!(refused, 9);

    temp.cleanup().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_returns_record_one_date() {
    let temp = TempDb::open().await;
    let db = &temp.db;

    let book = db.books().create("Dune", "Frank Herbert", None).await.unwrap();
    let member = db.members().create("Ann", "ann@example.com").await.unwrap();
    let loan = db.loans().borrow(book.id, member.id, None).await.unwrap();

    let returners = 8;
    let barrier = Arc::new(Barrier::new(returners));
    let mut handles = Vec::with_capacity(returners);
    for _ in 0..returners {
        let loans = db.loans();
        let barrier = Arc::clone(&barrier);
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            loans.return_loan(loan.id).await
        }));
    }

    let mut returned = Vec::new();
    let mut already = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(loan) => returned.push(loan),
            Err(CoreError::AlreadyReturned { .. }) => already += 1,
            Err(other) => panic!("unexpected return error: {other:?}"),
        }
    }

    assert_eq!(returned.len(), 1);
    assert_eq!(already, returners - 1);

    let stored = db.loans().get_by_id(loan.id).await.unwrap().unwrap();
    assert_eq!(stored.return_date, returned[0].return_date);

    temp.cleanup().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_lock_wait_timeout_is_retryable() {
    let temp = TempDb::open_with(Duration::from_millis(200)).await;
    let db = &temp.db;

    let book = db.books().create("Dune", "Frank Herbert", Some(2)).await.unwrap();
    let member = db.members().create("Ann", "ann@example.com").await.unwrap();

    let mut holder = db.pool().begin().await.unwrap();
    sqlx::query("UPDATE books SET copies = copies WHERE id = ?1")
        .bind(book.id)
        .execute(&mut *holder)
        .await
        .unwrap();

    let err = db.loans().borrow(book.id, member.id, None).await.unwrap_err();
    assert!(matches!(err, CoreError::StoreUnavailable(_)), "{err:?}");
    assert!(err.is_retryable());
    assert_eq!(db.loans().active_count(book.id).await.unwrap(), 0);

    holder.rollback().await.unwrap();

    // Same request once the lock is free.
    db.loans().borrow(book.id, member.id, None).await.unwrap();
    assert_eq!(db.books().availability(book.id).await.unwrap(), 1);

    temp.cleanup().await;
}
