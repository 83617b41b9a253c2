//! # Cart Service
//!
//! Cart operations as the request layer sees them: the pure `Cart` rules
//! from stockroom-core, a catalog check for new products, and a
//! `CartStore` to keep the result.
//!
//! ## Add to Cart Flow
//! ```text
//! add(session, product 5, qty 2)
//!      │
//!      ├── qty outside 1..=999?       → InvalidArgument
//!      ├── product 5 not in catalog?  → NotFound
//!      ▼
//! store.update(session, |cart| cart.add(5, 2))
//!      │
//!      └── returns the cart's lines after the change
//! ```

use tracing::debug;

use crate::cart_store::CartStore;
use crate::repository::product::ProductRepository;
use stockroom_core::validation::validate_quantity;
use stockroom_core::{CartLine, CoreError, CoreResult, SessionId};

/// Session cart operations over any `CartStore`.
#[derive(Debug, Clone)]
pub struct CartService<S> {
    store: S,
    products: ProductRepository,
}

impl<S: CartStore> CartService<S> {
    pub fn new(store: S, products: ProductRepository) -> Self {
        CartService { store, products }
    }

    /// Adds `quantity` of a product, summing with an existing line.
    pub async fn add(
        &self,
        session: &SessionId,
        product_id: i64,
        quantity: i64,
    ) -> CoreResult<Vec<CartLine>> {
        validate_quantity(quantity)?;

        if !self.products.exists(product_id).await? {
            return Err(CoreError::not_found("Product", product_id));
        }

        debug!(session = %session, product_id, quantity, "Adding to cart");

        self.store
            .update(session, |cart| {
                cart.add(product_id, quantity)?;
                Ok(cart.snapshot())
            })
            .await
    }

    /// Replaces the quantity of a line already in the cart.
    pub async fn set_quantity(
        &self,
        session: &SessionId,
        product_id: i64,
        quantity: i64,
    ) -> CoreResult<Vec<CartLine>> {
        debug!(session = %session, product_id, quantity, "Updating cart line");

        self.store
            .update(session, |cart| {
                cart.set_quantity(product_id, quantity)?;
                Ok(cart.snapshot())
            })
            .await
    }

    /// Removes a line from the cart.
    pub async fn remove(&self, session: &SessionId, product_id: i64) -> CoreResult<Vec<CartLine>> {
        debug!(session = %session, product_id, "Removing cart line");

        self.store
            .update(session, |cart| {
                cart.remove(product_id)?;
                Ok(cart.snapshot())
            })
            .await
    }

    /// Current lines, without side effects.
    pub async fn snapshot(&self, session: &SessionId) -> CoreResult<Vec<CartLine>> {
        self.store.snapshot(session).await
    }
}
