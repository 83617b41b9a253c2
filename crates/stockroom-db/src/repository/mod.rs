//! # Repository Module
//!
//! Database repository implementations for Stockroom.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repositories and their Tables                        │
//! │                                                                         │
//! │  BookRepository     books            create, availability, listing     │
//! │  MemberRepository   members          create (unique email), lookup     │
//! │  LoanRepository     loans            borrow / return state machine     │
//! │  ProductRepository  products         catalog admin, price lookup       │
//! │  OrderRepository    orders,          atomic order placement, reads     │
//! │                     order_lines                                        │
//! │                                                                         │
//! │  Each holds a cloned SqlitePool handle; obtain them from `Database`.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Plain reads return `DbResult`. Operations that validate input or enforce
//! a domain rule return `CoreResult`, so callers see `CapacityExceeded`,
//! `AlreadyReturned` and friends directly.

pub mod book;
pub mod loan;
pub mod member;
pub mod order;
pub mod product;
