//! # Domain Types
//!
//! Core domain types shared by the ledger, the cart and checkout.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Lending                                Purchasing                      │
//! │  ┌─────────────┐   ┌─────────────┐     ┌─────────────┐                 │
//! │  │    Book     │◄──│    Loan     │     │   Product   │                 │
//! │  │  copies     │   │  loan_date  │     │ price_cents │                 │
//! │  └─────────────┘   │  due_date   │     └──────▲──────┘                 │
//! │  ┌─────────────┐   │ return_date │            │ snapshot               │
//! │  │   Member    │◄──│  (None =    │     ┌──────┴──────┐  ┌──────────┐   │
//! │  │  email      │   │   active)   │     │  OrderLine  │─►│  Order   │   │
//! │  └─────────────┘   └─────────────┘     │ unit_price  │  │  total   │   │
//! │                                        └─────────────┘  └──────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Ids are database-assigned integers; session ids are UUID v4.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;
use uuid::Uuid;

use crate::money::Money;

// =============================================================================
// Book
// =============================================================================

/// A lendable title. `copies` is its capacity: the most loans that may be
/// active at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub copies: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A book together with how many copies can still be lent.
///
/// Listings use `available > 0` to decide whether borrowing is offered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct BookAvailability {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub copies: i64,
    pub available: i64,
}

// =============================================================================
// Member
// =============================================================================

/// A library member (the borrower).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Member {
    pub id: i64,
    pub name: String,
    /// Unique across members.
    pub email: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Loan
// =============================================================================

/// One lending of one book to one member.
///
/// ## Lifecycle
/// ```text
/// borrow()  ──►  Loan { return_date: None }   (active)
///                     │
/// return()  ──►  Loan { return_date: Some(t) } (closed, never changes again)
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Loan {
    pub id: i64,
    pub book_id: i64,
    pub member_id: i64,
    #[ts(as = "String")]
    pub loan_date: DateTime<Utc>,
    #[ts(as = "String")]
    pub due_date: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub return_date: Option<DateTime<Utc>>,
}

impl Loan {
    /// An active loan holds one copy of its book.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.return_date.is_none()
    }

    /// Active and past its due date.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.is_active() && now > self.due_date
    }
}

/// A loan joined with the names needed to list it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct LoanDetails {
    pub id: i64,
    pub book_id: i64,
    pub book_title: String,
    pub member_id: i64,
    pub member_name: String,
    pub member_email: String,
    #[ts(as = "String")]
    pub loan_date: DateTime<Utc>,
    #[ts(as = "String")]
    pub due_date: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub return_date: Option<DateTime<Utc>>,
}

// =============================================================================
// Product
// =============================================================================

/// A purchasable catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: i64,
    pub name: String,
    /// Current price in cents. Orders copy it; they never point at it.
    pub price_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Order
// =============================================================================

/// A checked-out cart. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Order {
    pub id: i64,
    /// Σ quantity × unit_price_cents over the order's lines.
    pub total_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Order {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A line of an order.
/// Uses the snapshot pattern: the price is frozen at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderLine {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    /// Unit price in cents at time of checkout (frozen).
    pub unit_price_cents: i64,
}

impl OrderLine {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price() * self.quantity
    }
}

/// An order read back with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderWithLines {
    pub order: Order,
    pub lines: Vec<OrderLine>,
}

/// What a successful checkout hands back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CheckoutReceipt {
    pub order_id: i64,
    pub total_cents: i64,
}

impl CheckoutReceipt {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Session Id
// =============================================================================

/// Key of a session-scoped cart.
///
/// The request layer maps its session cookie onto one of these; the cart
/// stores never see cookies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// A fresh random session id.
    pub fn new() -> Self {
        SessionId(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for SessionId {
    fn from(uuid: Uuid) -> Self {
        SessionId(uuid)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(SessionId)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
