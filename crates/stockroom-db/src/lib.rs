//! # stockroom-db: Store Layer for Stockroom
//!
//! SQLite persistence for the lending ledger, the product catalog, session
//! carts and orders, using sqlx for async access.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockroom Data Flow                              │
//! │                                                                         │
//! │  Request layer (borrow / return / add to cart / checkout)              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  stockroom-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌────────────────┐   ┌───────────────┐   │   │
//! │  │   │  CartService  │   │CheckoutService │   │ LoanRepository│   │   │
//! │  │   │  (cart.rs)    │   │ (checkout.rs)  │   │ borrow/return │   │   │
//! │  │   └──────┬────────┘   └───────┬────────┘   └───────┬───────┘   │   │
//! │  │          │                    │                    │           │   │
//! │  │   ┌──────▼────────┐   ┌───────▼────────┐           │           │   │
//! │  │   │  CartStore    │   │OrderRepository │           │           │   │
//! │  │   │ Memory|Sqlite │   │ place (1 tx)   │           │           │   │
//! │  │   └──────┬────────┘   └───────┬────────┘           │           │   │
//! │  │          └────────────────────┼────────────────────┘           │   │
//! │  │                        ┌──────▼──────┐                         │   │
//! │  │                        │  Database   │ pool.rs + migrations    │   │
//! │  │                        └─────────────┘                         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (WAL, foreign keys on, busy_timeout)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`config`] - Environment-driven application settings
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types and their mapping into `CoreError`
//! - [`repository`] - Books, members, loans, products, orders
//! - [`cart_store`] - Session cart persistence (in-memory and SQLite)
//! - [`cart`] - Cart operations with catalog checks
//! - [`checkout`] - Cart to order conversion
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stockroom_db::{CheckoutService, Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("stockroom.db")).await?;
//!
//! let loan = db.loans().borrow(book_id, member_id, None).await?;
//! db.loans().return_loan(loan.id).await?;
//!
//! let checkout = CheckoutService::new(db.carts(), db.orders());
//! let receipt = checkout.checkout(&session).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod cart_store;
pub mod checkout;
pub mod config;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use cart::CartService;
pub use cart_store::{CartStore, MemoryCartStore, SqliteCartStore};
pub use checkout::CheckoutService;
pub use config::{init_tracing, AppConfig, ConfigError};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::book::BookRepository;
pub use repository::loan::LoanRepository;
pub use repository::member::MemberRepository;
pub use repository::order::OrderRepository;
pub use repository::product::ProductRepository;
