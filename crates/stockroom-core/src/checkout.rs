//! # Checkout Pricing
//!
//! Turns cart lines plus one price snapshot into priced order lines and a
//! total. The store reads the snapshot inside the order transaction and
//! hands it here; nothing in this module looks prices up again.
//!
//! ```text
//! cart lines ──┐
//!              ├──► price_cart() ──► PricedCart { lines, total }
//! snapshot  ───┘         │
//!                        └── product missing from snapshot → InconsistentState
//! ```
//!
//! Lines that did not come out of a [`Cart`](crate::Cart) get the same
//! checks a cart applies, via [`validate_order_lines`].

use std::collections::{HashMap, HashSet};

use crate::cart::CartLine;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::validation::{validate_id, validate_quantity};
use crate::MAX_CART_LINES;

/// A cart line with the unit price it will be sold at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedLine {
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: Money,
}

impl PricedLine {
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price * self.quantity
    }
}

/// The result of pricing a whole cart.
///
/// `total` always equals the sum of `line_total()` over `lines`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedCart {
    pub lines: Vec<PricedLine>,
    pub total: Money,
}

/// Checks order lines the way a cart would have: a positive product id,
/// quantity in `1..=MAX_ITEM_QUANTITY`, one line per product, at most
/// `MAX_CART_LINES` lines.
pub fn validate_order_lines(lines: &[CartLine]) -> CoreResult<()> {
    if lines.is_empty() {
        return Err(CoreError::EmptyCart);
    }

    if lines.len() > MAX_CART_LINES {
        return Err(ValidationError::TooMany {
            field: "order lines".into(),
            max: MAX_CART_LINES,
        }
        .into());
    }

    let mut seen = HashSet::with_capacity(lines.len());
    for line in lines {
        validate_id("product_id", line.product_id)?;
        validate_quantity(line.quantity)?;
        if !seen.insert(line.product_id) {
            return Err(ValidationError::Duplicate {
                field: "product_id".into(),
                value: line.product_id.to_string(),
            }
            .into());
        }
    }

    Ok(())
}

/// Prices `lines` against `prices` (product id → current unit price).
///
/// ## Errors
/// - `EmptyCart` if there are no lines
/// - `InvalidArgument` if a line fails [`validate_order_lines`]
/// - `InconsistentState` naming every product absent from the snapshot
/// - `InvalidArgument` if the total does not fit in an `i64` of cents
///
/// ## Example
/// ```rust
/// use std::collections::HashMap;
/// use stockroom_core::{CartLine, Money};
/// use stockroom_core::checkout::price_cart;
///
/// let lines = [CartLine { product_id: 5, quantity: 2 }];
/// let prices = HashMap::from([(5, Money::from_major_minor(10, 0))]);
///
/// let priced = price_cart(&lines, &prices).unwrap();
/// assert_eq!(priced.total.to_string(), "20.00");
/// ```
pub fn price_cart(lines: &[CartLine], prices: &HashMap<i64, Money>) -> CoreResult<PricedCart> {
    validate_order_lines(lines)?;

    let missing: Vec<String> = lines
        .iter()
        .filter(|l| !prices.contains_key(&l.product_id))
        .map(|l| l.product_id.to_string())
        .collect();

    if !missing.is_empty() {
        return Err(CoreError::InconsistentState(format!(
            "products no longer in catalog: {}",
            missing.join(", ")
        )));
    }

    let overflow = || {
        CoreError::from(ValidationError::OutOfRange {
            field: "order total".to_string(),
            min: 0,
            max: i64::MAX,
        })
    };

    let mut total = Money::zero();
    let mut priced = Vec::with_capacity(lines.len());

    for line in lines {
        let Some(&unit_price) = prices.get(&line.product_id) else {
            return Err(CoreError::InconsistentState(format!(
                "product {} no longer in catalog",
                line.product_id
            )));
        };
        let line_total = unit_price
            .checked_multiply_quantity(line.quantity)
            .ok_or_else(overflow)?;
        total = total.checked_add(line_total).ok_or_else(overflow)?;

        priced.push(PricedLine {
            product_id: line.product_id,
            quantity: line.quantity,
            unit_price,
        });
    }

    Ok(PricedCart {
        lines: priced,
        total,
    })
}
