//! # Cart Stores
//!
//! Where session carts live between requests.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    CartStore                                            │
//! │                                                                         │
//! │  update(session, f)                                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  take the session's exclusive section                                  │
//! │       │   MemoryCartStore: async mutex over the map                    │
//! │       │   SqliteCartStore: write transaction (INSERT OR IGNORE first)  │
//! │       ▼                                                                 │
//! │  load cart (empty if new) → f(&mut cart)                               │
//! │       │                                                                 │
//! │       ├── Err → nothing written, cart unchanged                        │
//! │       └── Ok  → cart written back (an emptied cart is dropped)         │
//! │                                                                         │
//! │  snapshot(session) reads only; it never creates a cart.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::store_err;
use stockroom_core::{Cart, CartLine, CoreResult, SessionId};

/// Keyed storage of one cart per session.
///
/// Implementations run each `update` atomically per session: concurrent
/// updates of the same session never interleave, and a mutation that
/// returns an error leaves the stored cart untouched.
pub trait CartStore: Send + Sync {
    /// Current lines of the session's cart, empty if it has none.
    fn snapshot(&self, session: &SessionId)
        -> impl Future<Output = CoreResult<Vec<CartLine>>> + Send;

    /// Applies `f` to the session's cart and persists the result if `f`
    /// succeeds.
    fn update<F, R>(
        &self,
        session: &SessionId,
        f: F,
    ) -> impl Future<Output = CoreResult<R>> + Send
    where
        F: FnOnce(&mut Cart) -> CoreResult<R> + Send,
        R: Send;
}

// =============================================================================
// In-memory store
// =============================================================================

/// Process-local cart store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryCartStore {
    carts: Arc<Mutex<HashMap<SessionId, Cart>>>,
}

impl MemoryCartStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions holding a non-empty cart.
    pub async fn len(&self) -> usize {
        self.carts.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.carts.lock().await.is_empty()
    }
}

impl CartStore for MemoryCartStore {
    async fn snapshot(&self, session: &SessionId) -> CoreResult<Vec<CartLine>> {
        let carts = self.carts.lock().await;
        Ok(carts.get(session).map(Cart::snapshot).unwrap_or_default())
    }

    async fn update<F, R>(&self, session: &SessionId, f: F) -> CoreResult<R>
    where
        F: FnOnce(&mut Cart) -> CoreResult<R> + Send,
        R: Send,
    {
        let mut carts = self.carts.lock().await;

        let mut cart = carts.get(session).cloned().unwrap_or_default();
        let result = f(&mut cart)?;

        if cart.is_empty() {
            carts.remove(session);
        } else {
            carts.insert(*session, cart);
        }

        Ok(result)
    }
}

// =============================================================================
// SQLite store
// =============================================================================

/// Cart store backed by the `carts` / `cart_lines` tables.
#[derive(Debug, Clone)]
pub struct SqliteCartStore {
    pool: SqlitePool,
}

impl SqliteCartStore {
    pub fn new(pool: SqlitePool) -> Self {
        SqliteCartStore { pool }
    }
}

impl CartStore for SqliteCartStore {
    async fn snapshot(&self, session: &SessionId) -> CoreResult<Vec<CartLine>> {
        let rows: Vec<(i64, i64)> = sqlx::query_as(
            r#"
            SELECT product_id, quantity FROM cart_lines
            WHERE session_id = ?1
            ORDER BY position
            "#,
        )
        .bind(session.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(rows.into_iter().map(to_line).collect())
    }

    async fn update<F, R>(&self, session: &SessionId, f: F) -> CoreResult<R>
    where
        F: FnOnce(&mut Cart) -> CoreResult<R> + Send,
        R: Send,
    {
        let key = session.to_string();
        let mut tx = self.pool.begin().await.map_err(store_err)?;

        // Write first: the session row doubles as the cart lock.
        sqlx::query("INSERT OR IGNORE INTO carts (session_id, created_at) VALUES (?1, ?2)")
            .bind(&key)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;

        let created_at: DateTime<Utc> =
            sqlx::query_scalar("SELECT created_at FROM carts WHERE session_id = ?1")
                .bind(&key)
                .fetch_one(&mut *tx)
                .await
                .map_err(store_err)?;

        let rows: Vec<(i64, i64)> = sqlx::query_as(
            "SELECT product_id, quantity FROM cart_lines WHERE session_id = ?1 ORDER BY position",
        )
        .bind(&key)
        .fetch_all(&mut *tx)
        .await
        .map_err(store_err)?;

        let mut cart = Cart::restore(rows.into_iter().map(to_line).collect(), created_at);

        let result = match f(&mut cart) {
            Ok(result) => result,
            Err(err) => {
                tx.rollback().await.map_err(store_err)?;
                return Err(err);
            }
        };

        if cart.is_empty() {
            sqlx::query("DELETE FROM carts WHERE session_id = ?1")
                .bind(&key)
                .execute(&mut *tx)
                .await
                .map_err(store_err)?;
        } else {
            sqlx::query("DELETE FROM cart_lines WHERE session_id = ?1")
                .bind(&key)
                .execute(&mut *tx)
                .await
                .map_err(store_err)?;

            for (position, line) in cart.lines().iter().enumerate() {
                sqlx::query(
                    r#"
                    INSERT INTO cart_lines (session_id, product_id, quantity, position)
                    VALUES (?1, ?2, ?3, ?4)
                    "#,
                )
                .bind(&key)
                .bind(line.product_id)
                .bind(line.quantity)
                .bind(position as i64)
                .execute(&mut *tx)
                .await
                .map_err(store_err)?;
            }
        }

        tx.commit().await.map_err(store_err)?;

        debug!(session = %session, lines = cart.lines().len(), "Cart saved");
        Ok(result)
    }
}

fn to_line((product_id, quantity): (i64, i64)) -> CartLine {
    CartLine {
        product_id,
        quantity,
    }
}
