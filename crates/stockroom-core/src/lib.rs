//! # stockroom-core: Pure Domain Logic for Stockroom
//!
//! Everything here is deterministic and free of I/O. The database crate
//! wraps these rules in transactions; this crate only decides.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockroom Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Request layer (routing, sessions, JSON)            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │          stockroom-db: ledger, cart stores, checkout            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ stockroom-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐  ┌─────────┐  ┌─────────┐  ┌──────────┐          │   │
//! │  │   │  types  │  │  money  │  │  cart   │  │ checkout │          │   │
//! │  │   │  Book   │  │  Money  │  │  Cart   │  │  pricing │          │   │
//! │  │   │  Loan   │  │         │  │CartLine │  │          │          │   │
//! │  │   └─────────┘  └─────────┘  └─────────┘  └──────────┘          │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Book, Member, Loan, Product, Order, ...)
//! - [`money`] - Money type with integer arithmetic
//! - [`cart`] - Session cart and its mutation rules
//! - [`checkout`] - Pricing a cart against a price snapshot
//! - [`loan`] - Loan window and availability math
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use stockroom_core::cart::Cart;
//!
//! let mut cart = Cart::new();
//! cart.add(5, 2).unwrap();
//! cart.add(5, 3).unwrap();
//!
//! assert_eq!(cart.lines().len(), 1);
//! assert_eq!(cart.lines()[0].quantity, 5);
//! ```

pub mod cart;
pub mod checkout;
pub mod error;
pub mod loan;
pub mod money;
pub mod types;
pub mod validation;

// These allow users to do `use stockroom_core::Money` instead of
// `use stockroom_core::money::Money`
pub use cart::{Cart, CartLine};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Loan length used when the caller does not ask for one.
pub const DEFAULT_LOAN_DAYS: i64 = 14;

/// Longest loan a single borrow may request.
pub const MAX_LOAN_DAYS: i64 = 365;

/// Maximum distinct lines in a single cart.
///
/// ## Business Reason
/// Prevents runaway carts and keeps checkout transactions small.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of a single product in a cart.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10)
pub const MAX_ITEM_QUANTITY: i64 = 999;
