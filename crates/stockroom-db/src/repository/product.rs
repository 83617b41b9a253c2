//! # Product Repository
//!
//! Database operations for purchasable products.
//!
//! ## Key Operations
//! - Catalog administration (create, re-price, delete)
//! - Existence checks for the cart
//!
//! Prices are integer cents. An order copies the price it was charged into
//! its own lines, so re-pricing a product never changes past orders.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{store_err, DbError, DbResult};
use stockroom_core::validation::{validate_name, validate_price_cents};
use stockroom_core::{CoreError, CoreResult, Product};

const PRODUCT_COLUMNS: &str = "id, name, price_cents, created_at, updated_at";

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let mug = repo.create("Mug", 1250).await?;
/// repo.update_price(mug.id, 1400).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Adds a product to the catalog.
    ///
    /// ## Arguments
    /// * `price_cents` - Unit price, zero allowed
    pub async fn create(&self, name: &str, price_cents: i64) -> CoreResult<Product> {
        let name = validate_name("name", name)?;
        validate_price_cents(price_cents)?;

        debug!(name = %name, price_cents, "Inserting product");

        let now = Utc::now();
        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            INSERT INTO products (name, price_cents, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?3)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(&name)
        .bind(price_cents)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(product)
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Whether a product with this ID exists.
    pub async fn exists(&self, id: i64) -> DbResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM products WHERE id = ?1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }

    /// The whole catalog, by name.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name, id"
        ))
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    /// Changes the unit price charged by future checkouts.
    ///
    /// ## Returns
    /// * `Ok(Product)` - The re-priced product
    /// * `Err(NotFound)` - Product doesn't exist
    pub async fn update_price(&self, id: i64, price_cents: i64) -> CoreResult<Product> {
        validate_price_cents(price_cents)?;

        debug!(id, price_cents, "Updating product price");

        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products SET price_cents = ?2, updated_at = ?3
            WHERE id = ?1
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(price_cents)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        product.ok_or_else(|| CoreError::not_found("Product", id))
    }

    /// Deletes a product.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    /// * `Err(DbError::ForeignKeyViolation)` - Past orders reference it
    ///
    /// Carts may still hold the id; their checkout then fails with
    /// `InconsistentState` until the line is removed.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts products (for diagnostics and the seeder).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{memory_db, product};
    use stockroom_core::{CartLine, Money, ValidationError};

    #[tokio::test]
    async fn test_create_and_get() {
        let db = memory_db().await;
        let mug = product(&db, "Mug", 1250).await;

        assert_eq!(mug.price(), Money::from_cents(1250));
        assert_eq!(db.products().get_by_id(mug.id).await.unwrap(), Some(mug.clone()));
        assert!(db.products().exists(mug.id).await.unwrap());
        assert!(!db.products().exists(mug.id + 1).await.unwrap());
    }

    #[tokio::test]
    async fn test_negative_price_rejected() {
        let db = memory_db().await;
        let err = db.products().create("Mug", -1).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidArgument(ValidationError::OutOfRange { .. })
        ));

        let free = db.products().create("Sticker", 0).await.unwrap();
        assert!(free.price().is_zero());
    }

    #[tokio::test]
    async fn test_update_price() {
        let db = memory_db().await;
        let mug = product(&db, "Mug", 1250).await;

        let repriced = db.products().update_price(mug.id, 1400).await.unwrap();
        assert_eq!(repriced.price_cents, 1400);
        assert!(repriced.updated_at >= mug.updated_at);

        let err = db.products().update_price(404, 100).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_list_by_name() {
        let db = memory_db().await;
        product(&db, "Tea", 300).await;
        product(&db, "Mug", 1250).await;

        let names: Vec<String> = db
            .products()
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Mug", "Tea"]);
    }

    #[tokio::test]
    async fn test_delete_unreferenced_and_referenced() {
        let db = memory_db().await;
        let tea = product(&db, "Tea", 300).await;
        let mug = product(&db, "Mug", 1250).await;

        db.products().delete(tea.id).await.unwrap();
        assert!(matches!(
            db.products().delete(tea.id).await,
            Err(DbError::NotFound { .. })
        ));

        db.orders()
            .place(&[CartLine {
                product_id: mug.id,
                quantity: 1,
            }])
            .await
            .unwrap();
        assert!(matches!(
            db.products().delete(mug.id).await,
            Err(DbError::ForeignKeyViolation { .. })
        ));
        assert_eq!(db.products().count().await.unwrap(), 1);
    }
}
