//! # Checkout Service
//!
//! Converts a session's cart into an order.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    checkout(session)                                    │
//! │                                                                         │
//! │  lines = carts.snapshot(session)                                       │
//! │       │   empty → EmptyCart                                            │
//! │       ▼                                                                 │
//! │  orders.place(lines)            ← one transaction, see OrderRepository │
//! │       │   Err → cart untouched, error returned                         │
//! │       ▼                                                                 │
//! │  COMMITTED                                                              │
//! │       │                                                                 │
//! │  carts.update(session, settle)  ← only now; drops the ordered lines,   │
//! │       │                            keeps lines added since snapshot    │
//! │       ▼                                                                 │
//! │  CheckoutReceipt { order_id, total }                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tracing::{debug, warn};

use crate::cart_store::CartStore;
use crate::repository::order::OrderRepository;
use stockroom_core::{CheckoutReceipt, CoreError, CoreResult, SessionId};

/// Checkout over any `CartStore`.
#[derive(Debug, Clone)]
pub struct CheckoutService<S> {
    carts: S,
    orders: OrderRepository,
}

impl<S: CartStore> CheckoutService<S> {
    pub fn new(carts: S, orders: OrderRepository) -> Self {
        CheckoutService { carts, orders }
    }

    /// Places an order for the session's cart and empties the cart.
    ///
    /// ## Returns
    /// * `Ok(CheckoutReceipt)` - Order id and total
    /// * `Err(EmptyCart)` - Nothing to check out
    /// * `Err(InconsistentState)` - A product in the cart left the catalog
    /// * `Err(StoreUnavailable)` - Store failure; nothing was persisted
    ///
    /// The ordered lines leave the cart only once the order has committed;
    /// anything the session added meanwhile is kept for the next checkout.
    /// If that update fails, the committed order is still reported.
    pub async fn checkout(&self, session: &SessionId) -> CoreResult<CheckoutReceipt> {
        let lines = self.carts.snapshot(session).await?;
        if lines.is_empty() {
            return Err(CoreError::EmptyCart);
        }

        debug!(session = %session, lines = lines.len(), "Checking out");

        let receipt = self.orders.place(&lines).await?;

        // Lines added to the session since the snapshot stay in the cart.
        let settled = self
            .carts
            .update(session, |cart| {
                cart.settle(&lines);
                Ok(())
            })
            .await;
        if let Err(err) = settled {
            warn!(
                session = %session,
                order_id = receipt.order_id,
                error = %err,
                "Order committed but cart could not be updated"
            );
        }

        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::CartService;
    use crate::cart_store::MemoryCartStore;
    use crate::test_support::{memory_db, product};
    use stockroom_core::{Cart, CartLine, Money};

    /// Adds `late_product` to the cart right after every snapshot, as a
    /// second request of the same session would.
    struct LateAddStore {
        inner: MemoryCartStore,
        late_product: i64,
    }

    impl CartStore for LateAddStore {
        async fn snapshot(&self, session: &SessionId) -> CoreResult<Vec<CartLine>> {
            let lines = self.inner.snapshot(session).await?;
            let late = self.late_product;
            self.inner.update(session, |cart| cart.add(late, 1)).await?;
            Ok(lines)
        }

        async fn update<F, R>(&self, session: &SessionId, f: F) -> CoreResult<R>
        where
            F: FnOnce(&mut Cart) -> CoreResult<R> + Send,
            R: Send,
        {
            self.inner.update(session, f).await
        }
    }

    #[tokio::test]
    async fn test_checkout_totals_and_clears_cart() {
        let db = memory_db().await;
        let item = product(&db, "Mug", 1000).await;
        let carts = CartService::new(db.carts(), db.products());
        let checkout = CheckoutService::new(db.carts(), db.orders());
        let session = SessionId::new();

        carts.add(&session, item.id, 2).await.unwrap();
        let receipt = checkout.checkout(&session).await.unwrap();

        assert_eq!(receipt.total().to_string(), "20.00");
        let order = db
            .orders()
            .order_with_lines(receipt.order_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(order.lines.len(), 1);
        assert_eq!(order.lines[0].quantity, 2);
        assert_eq!(order.lines[0].unit_price(), Money::from_cents(1000));

        assert!(carts.snapshot(&session).await.unwrap().is_empty());
        let err = checkout.checkout(&session).await.unwrap_err();
        assert!(matches!(err, CoreError::EmptyCart));
        assert_eq!(db.orders().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_failed_checkout_keeps_cart_and_persists_nothing() {
        let db = memory_db().await;
        let mug = product(&db, "Mug", 1000).await;
        let tea = product(&db, "Tea", 250).await;
        let store = MemoryCartStore::new();
        let carts = CartService::new(store.clone(), db.products());
        let checkout = CheckoutService::new(store, db.orders());
        let session = SessionId::new();

        carts.add(&session, mug.id, 1).await.unwrap();
        carts.add(&session, tea.id, 4).await.unwrap();
        db.products().delete(tea.id).await.unwrap();

        let err = checkout.checkout(&session).await.unwrap_err();
        assert!(matches!(err, CoreError::InconsistentState(_)));

        assert_eq!(db.orders().count().await.unwrap(), 0);
        assert_eq!(db.orders().line_count().await.unwrap(), 0);
        assert_eq!(carts.snapshot(&session).await.unwrap().len(), 2);

        carts.remove(&session, tea.id).await.unwrap();
        let receipt = checkout.checkout(&session).await.unwrap();
        assert_eq!(receipt.total_cents, 1000);
    }

    #[tokio::test]
    async fn test_checkout_only_touches_its_session() {
        let db = memory_db().await;
        let mug = product(&db, "Mug", 1000).await;
        let store = MemoryCartStore::new();
        let carts = CartService::new(store.clone(), db.products());
        let checkout = CheckoutService::new(store, db.orders());
        let alice = SessionId::new();
        let bob = SessionId::new();

        carts.add(&alice, mug.id, 1).await.unwrap();
        carts.add(&bob, mug.id, 3).await.unwrap();

        checkout.checkout(&alice).await.unwrap();
        assert!(carts.snapshot(&alice).await.unwrap().is_empty());
        assert_eq!(carts.snapshot(&bob).await.unwrap()[0].quantity, 3);
    }

    #[tokio::test]
    async fn test_line_added_during_checkout_stays_in_cart() {
        let db = memory_db().await;
        let mug = product(&db, "Mug", 1000).await;
        let tea = product(&db, "Tea", 250).await;
        let store = MemoryCartStore::new();
        let carts = CartService::new(store.clone(), db.products());
        let checkout = CheckoutService::new(
            LateAddStore {
                inner: store,
                late_product: tea.id,
            },
            db.orders(),
        );
        let session = SessionId::new();

        carts.add(&session, mug.id, 1).await.unwrap();
        let receipt = checkout.checkout(&session).await.unwrap();

        let order = db
            .orders()
            .order_with_lines(receipt.order_id)
            .await
            .unwrap()
            .unwrap();
        let ordered: Vec<i64> = order.lines.iter().map(|l| l.product_id).collect();
        assert_eq!(ordered, vec![mug.id]);
        assert_eq!(receipt.total_cents, 1000);

        assert_eq!(
            carts.snapshot(&session).await.unwrap(),
            vec![CartLine {
                product_id: tea.id,
                quantity: 1
            }]
        );
    }
}
