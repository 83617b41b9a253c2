//! # Member Repository
//!
//! Borrowers. Emails are unique, compared case-insensitively
//! (`COLLATE NOCASE` plus lowercasing on the way in).

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use stockroom_core::validation::{validate_email, validate_name};
use stockroom_core::{CoreResult, Member};

/// Repository for members.
#[derive(Debug, Clone)]
pub struct MemberRepository {
    pool: SqlitePool,
}

impl MemberRepository {
    /// Creates a new MemberRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MemberRepository { pool }
    }

    /// Registers a member.
    ///
    /// ## Returns
    /// * `Err(CoreError::InvalidArgument(Duplicate))` - Email already registered
    pub async fn create(&self, name: &str, email: &str) -> CoreResult<Member> {
        let name = validate_name("name", name)?;
        let email = validate_email(email)?;

        debug!(email = %email, "Inserting member");

        let member = sqlx::query_as::<_, Member>(
            r#"
            INSERT INTO members (name, email, created_at)
            VALUES (?1, ?2, ?3)
            RETURNING id, name, email, created_at
            "#,
        )
        .bind(&name)
        .bind(&email)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("email", email.as_str()),
            other => other,
        })?;

        Ok(member)
    }

    /// Gets a member by ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Member>> {
        let member = sqlx::query_as::<_, Member>(
            "SELECT id, name, email, created_at FROM members WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }

    /// All members, by name.
    pub async fn list(&self) -> DbResult<Vec<Member>> {
        let members = sqlx::query_as::<_, Member>(
            "SELECT id, name, email, created_at FROM members ORDER BY name, id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }

    /// Counts members (for diagnostics and the seeder).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM members")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::memory_db;
    use stockroom_core::{CoreError, ValidationError};

    #[tokio::test]
    async fn test_create_normalizes_email() {
        let db = memory_db().await;
        let ann = db.members().create(" Ann ", "Ann@Example.COM").await.unwrap();

        assert_eq!(ann.name, "Ann");
        assert_eq!(ann.email, "ann@example.com");
        assert_eq!(db.members().get_by_id(ann.id).await.unwrap(), Some(ann));
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let db = memory_db().await;
        db.members().create("Ann", "ann@example.com").await.unwrap();

        let err = db
            .members()
            .create("Another Ann", "ANN@example.com")
            .await
            .unwrap_err();
        match err {
            CoreError::InvalidArgument(ValidationError::Duplicate { field, value }) => {
                assert_eq!(field, "email");
                assert_eq!(value, "ann@example.com");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(db.members().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_invalid_email_rejected() {
        let db = memory_db().await;
        let err = db.members().create("Ann", "not-an-email").await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidArgument(ValidationError::InvalidFormat { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_by_name() {
        let db = memory_db().await;
        db.members().create("Zoe", "zoe@example.com").await.unwrap();
        db.members().create("Ann", "ann@example.com").await.unwrap();

        let names: Vec<String> = db
            .members()
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, vec!["Ann", "Zoe"]);
    }
}
