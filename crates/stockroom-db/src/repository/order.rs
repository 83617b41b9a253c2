//! # Order Repository
//!
//! Turns cart lines into a persisted order in one transaction, and reads
//! orders back.
//!
//! ## Order Placement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    place(lines)                                         │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │   1. INSERT INTO orders (total 0)        ← first statement is a write  │
//! │   2. SELECT id, price_cents FROM products WHERE id IN (…)   one read   │
//! │   3. price_cart(lines, prices)                                         │
//! │        └── product gone → InconsistentState ──► ROLLBACK               │
//! │   4. INSERT INTO order_lines (…, unit_price_cents)  per line           │
//! │   5. UPDATE orders SET total_cents = Σ qty × unit                      │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Failure at any step leaves no order and no lines behind.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The unit price is read inside the transaction and copied into each line.
//! Later price changes do not touch stored orders; `order_lines` rejects
//! UPDATE and DELETE outright.

use std::collections::{BTreeSet, HashMap};

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{store_err, DbResult};
use stockroom_core::checkout::{price_cart, validate_order_lines};
use stockroom_core::{
    CartLine, CheckoutReceipt, CoreResult, Money, Order, OrderLine, OrderWithLines,
};

/// Repository for orders and their lines.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Persists an order for `lines` at current catalog prices.
    ///
    /// ## Returns
    /// * `Ok(CheckoutReceipt)` - Committed order id and total
    /// * `Err(EmptyCart)` - No lines
    /// * `Err(InvalidArgument)` - Bad quantity or id, or a product listed twice
    /// * `Err(InconsistentState)` - A line names a product that no longer exists
    /// * `Err(StoreUnavailable)` - Lock wait timed out or the store failed
    pub async fn place(&self, lines: &[CartLine]) -> CoreResult<CheckoutReceipt> {
        validate_order_lines(lines)?;

        debug!(lines = lines.len(), "Placing order");

        let mut tx = self.pool.begin().await.map_err(store_err)?;

        let order_id: i64 = sqlx::query_scalar(
            "INSERT INTO orders (total_cents, created_at) VALUES (0, ?1) RETURNING id",
        )
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(store_err)?;

        let product_ids: BTreeSet<i64> = lines.iter().map(|l| l.product_id).collect();
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT id, price_cents FROM products WHERE id IN (");
        let mut ids = query.separated(", ");
        for id in &product_ids {
            ids.push_bind(*id);
        }
        ids.push_unseparated(")");

        let rows: Vec<(i64, i64)> = query
            .build_query_as()
            .fetch_all(&mut *tx)
            .await
            .map_err(store_err)?;
        let prices: HashMap<i64, Money> = rows
            .into_iter()
            .map(|(id, cents)| (id, Money::from_cents(cents)))
            .collect();

        let priced = match price_cart(lines, &prices) {
            Ok(priced) => priced,
            Err(err) => {
                warn!(order_id, error = %err, "Order rejected, rolling back");
                tx.rollback().await.map_err(store_err)?;
                return Err(err);
            }
        };

        for line in &priced.lines {
            sqlx::query(
                r#"
                INSERT INTO order_lines (order_id, product_id, quantity, unit_price_cents)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )
            .bind(order_id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(line.unit_price.cents())
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;
        }

        sqlx::query("UPDATE orders SET total_cents = ?1 WHERE id = ?2")
            .bind(priced.total.cents())
            .bind(order_id)
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;

        tx.commit().await.map_err(store_err)?;

        info!(
            order_id,
            lines = priced.lines.len(),
            total = %priced.total,
            "Order committed"
        );

        Ok(CheckoutReceipt {
            order_id,
            total_cents: priced.total.cents(),
        })
    }

    /// Gets an order by ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(
            "SELECT id, total_cents, created_at FROM orders WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// Lines of an order, in insertion order.
    pub async fn get_lines(&self, order_id: i64) -> DbResult<Vec<OrderLine>> {
        let lines = sqlx::query_as::<_, OrderLine>(
            r#"
            SELECT id, order_id, product_id, quantity, unit_price_cents
            FROM order_lines
            WHERE order_id = ?1
            ORDER BY id
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// An order together with its lines, or `None`.
    pub async fn order_with_lines(&self, order_id: i64) -> DbResult<Option<OrderWithLines>> {
        let Some(order) = self.get_by_id(order_id).await? else {
            return Ok(None);
        };
        let lines = self.get_lines(order_id).await?;

        Ok(Some(OrderWithLines { order, lines }))
    }

    /// All orders, newest first.
    pub async fn list(&self) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(
            "SELECT id, total_cents, created_at FROM orders ORDER BY id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// Counts orders (for diagnostics and tests).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Counts order lines across all orders.
    pub async fn line_count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM order_lines")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{memory_db, product};
    use crate::error::DbError;
    use stockroom_core::{CoreError, ValidationError};

    fn line(product_id: i64, quantity: i64) -> CartLine {
        CartLine {
            product_id,
            quantity,
        }
    }

    #[tokio::test]
    async fn test_place_prices_and_persists() {
        let db = memory_db().await;
        let mug = product(&db, "Mug", 1000).await;
        let tea = product(&db, "Tea", 250).await;

        let receipt = db
            .orders()
            .place(&[line(mug.id, 2), line(tea.id, 3)])
            .await
            .unwrap();
        assert_eq!(receipt.total(), Money::from_cents(2750));

        let stored = db.orders().order_with_lines(receipt.order_id).await.unwrap().unwrap();
        assert_eq!(stored.order.total_cents, 2750);
        assert_eq!(stored.lines.len(), 2);
        let sum: Money = stored.lines.iter().map(OrderLine::line_total).sum();
        assert_eq!(sum, stored.order.total());
    }

    #[tokio::test]
    async fn test_place_empty_is_rejected() {
        let db = memory_db().await;
        let err = db.orders().place(&[]).await.unwrap_err();
        assert!(matches!(err, CoreError::EmptyCart));
        assert_eq!(db.orders().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_missing_product_rolls_back_everything() {
        let db = memory_db().await;
        let mug = product(&db, "Mug", 1000).await;

        let err = db
            .orders()
            .place(&[line(mug.id, 1), line(9999, 1)])
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InconsistentState(_)));

        assert_eq!(db.orders().count().await.unwrap(), 0);
        assert_eq!(db.orders().line_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_price_snapshot_survives_repricing() {
        let db = memory_db().await;
        let mug = product(&db, "Mug", 1000).await;

        let receipt = db.orders().place(&[line(mug.id, 1)]).await.unwrap();
        db.products().update_price(mug.id, 1500).await.unwrap();

        let stored = db.orders().order_with_lines(receipt.order_id).await.unwrap().unwrap();
        assert_eq!(stored.lines[0].unit_price_cents, 1000);
        assert_eq!(stored.order.total_cents, 1000);

        let next = db.orders().place(&[line(mug.id, 1)]).await.unwrap();
        assert_eq!(next.total_cents, 1500);
    }

    #[tokio::test]
    async fn test_malformed_lines_are_rejected_before_the_store() {
        let db = memory_db().await;
        let mug = product(&db, "Mug", 1000).await;

        let err = db.orders().place(&[line(mug.id, 0)]).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(_)));
        assert!(!err.is_retryable());

        let err = db
            .orders()
            .place(&[line(mug.id, 1), line(mug.id, 2)])
            .await
            .unwrap_err();
        match err {
            CoreError::InvalidArgument(ValidationError::Duplicate { field, .. }) => {
                assert_eq!(field, "product_id");
            }
            other => panic!("expected Duplicate, got {other:?}"),
        }

        assert_eq!(db.orders().count().await.unwrap(), 0);
        assert_eq!(db.orders().line_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_order_lines_are_immutable() {
        let db = memory_db().await;
        let mug = product(&db, "Mug", 1000).await;
        let receipt = db.orders().place(&[line(mug.id, 1)]).await.unwrap();

        let update = sqlx::query("UPDATE order_lines SET quantity = 5 WHERE order_id = ?1")
            .bind(receipt.order_id)
            .execute(db.pool())
            .await
            .map_err(DbError::from);
        assert!(matches!(update, Err(DbError::ConstraintViolation(_))));

        let delete = sqlx::query("DELETE FROM order_lines WHERE order_id = ?1")
            .bind(receipt.order_id)
            .execute(db.pool())
            .await;
        assert!(delete.is_err());
        assert_eq!(db.orders().line_count().await.unwrap(), 1);

        let negative = sqlx::query("INSERT INTO orders (total_cents, created_at) VALUES (-1, 'x')")
            .execute(db.pool())
            .await
            .map_err(DbError::from);
        assert!(matches!(negative, Err(DbError::ConstraintViolation(_))));
    }

    #[tokio::test]
    async fn test_list_newest_first_and_unknown_order() {
        let db = memory_db().await;
        let mug = product(&db, "Mug", 1000).await;
        let first = db.orders().place(&[line(mug.id, 1)]).await.unwrap();
        let second = db.orders().place(&[line(mug.id, 2)]).await.unwrap();

        let ids: Vec<i64> = db.orders().list().await.unwrap().iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![second.order_id, first.order_id]);
        assert!(db.orders().order_with_lines(404).await.unwrap().is_none());
    }
}
