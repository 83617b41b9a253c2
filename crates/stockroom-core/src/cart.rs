//! # Cart
//!
//! The session-scoped shopping cart: product ids and quantities, nothing
//! else. Prices are deliberately absent; checkout reads them.
//!
//! ## Cart Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  add(p, n)           ──► line for p exists? qty += n : push (p, n)      │
//! │  set_quantity(p, n)  ──► line for p exists? qty = n  : NotFound         │
//! │  remove(p)           ──► line for p exists? drop it  : NotFound         │
//! │  snapshot()          ──► (read only)                                    │
//! │  settle(ordered)     ──► after a checkout commits: drop what was        │
//! │                          ordered, keep anything added since             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Product existence is the caller's concern (the cart has no catalog).
//! Every rejected mutation leaves the cart exactly as it was.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::validation::{validate_cart_size, validate_id, validate_quantity};
use crate::MAX_ITEM_QUANTITY;

/// One line of a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartLine {
    pub product_id: i64,
    /// Always ≥ 1.
    pub quantity: i64,
}

/// The shopping cart of one session.
///
/// ## Invariants
/// - Lines are unique by `product_id` (adding again increases quantity)
/// - Every quantity is in `1..=MAX_ITEM_QUANTITY`
/// - At most `MAX_CART_LINES` lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,

    /// When the cart was created/last cleared.
    created_at: DateTime<Utc>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart {
            lines: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Rebuilds a cart from persisted lines.
    pub fn restore(lines: Vec<CartLine>, created_at: DateTime<Utc>) -> Self {
        Cart { lines, created_at }
    }

    /// Adds `quantity` of a product, summing with an existing line.
    ///
    /// ## Errors
    /// - `InvalidArgument` if `quantity < 1`, the summed quantity exceeds
    ///   `MAX_ITEM_QUANTITY`, or a new line would exceed `MAX_CART_LINES`
    pub fn add(&mut self, product_id: i64, quantity: i64) -> CoreResult<()> {
        validate_id("product_id", product_id)?;
        validate_quantity(quantity)?;

        if let Some(line) = self.line_mut(product_id) {
            let new_qty = line.quantity + quantity;
            if new_qty > MAX_ITEM_QUANTITY {
                return Err(ValidationError::OutOfRange {
                    field: "quantity".to_string(),
                    min: 1,
                    max: MAX_ITEM_QUANTITY,
                }
                .into());
            }
            line.quantity = new_qty;
            return Ok(());
        }

        validate_cart_size(self.lines.len())?;
        self.lines.push(CartLine {
            product_id,
            quantity,
        });
        Ok(())
    }

    /// Replaces the quantity of an existing line. This is an update, not an
    /// upsert.
    ///
    /// ## Errors
    /// - `InvalidArgument` if `quantity` is outside `1..=MAX_ITEM_QUANTITY`
    /// - `NotFound` if the product has no line in this cart
    pub fn set_quantity(&mut self, product_id: i64, quantity: i64) -> CoreResult<()> {
        validate_quantity(quantity)?;

        match self.line_mut(product_id) {
            Some(line) => {
                line.quantity = quantity;
                Ok(())
            }
            None => Err(CoreError::not_found("Cart line", product_id)),
        }
    }

    /// Removes a line by product id.
    pub fn remove(&mut self, product_id: i64) -> CoreResult<()> {
        let initial_len = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);

        if self.lines.len() == initial_len {
            Err(CoreError::not_found("Cart line", product_id))
        } else {
            Ok(())
        }
    }

    /// Empties the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.created_at = Utc::now();
    }

    /// Takes an order placed from an earlier snapshot of this cart out of
    /// it.
    ///
    /// If the cart still holds exactly `ordered`, it is cleared. Otherwise
    /// each ordered quantity is subtracted from its line, and lines added or
    /// grown since the snapshot keep the remainder.
    pub fn settle(&mut self, ordered: &[CartLine]) {
        if self.lines.as_slice() == ordered {
            self.clear();
            return;
        }

        for done in ordered {
            if let Some(line) = self.line_mut(done.product_id) {
                line.quantity -= done.quantity;
            }
        }
        self.lines.retain(|l| l.quantity > 0);
    }

    /// The current lines, in insertion order.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// An owned copy of the current lines.
    pub fn snapshot(&self) -> Vec<CartLine> {
        self.lines.clone()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of all quantities.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Distinct product ids referenced by the cart.
    pub fn product_ids(&self) -> Vec<i64> {
        self.lines.iter().map(|l| l.product_id).collect()
    }

    fn line_mut(&mut self, product_id: i64) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|l| l.product_id == product_id)
    }
}

impl Default for Cart {
    fn default() -> Self {
        Self::new()
    }
}
