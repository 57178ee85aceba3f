//! User repository for Depot.

use super::user::{NewUser, User};
use super::DbPool;
use crate::{DepotError, Result};

/// Repository for user records.
pub struct UserRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new UserRepository with the given database pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a new user in the database.
    ///
    /// A concurrent registration of the same email loses on the unique
    /// index and is reported as [`DepotError::DuplicateEmail`].
    pub async fn create(&self, new_user: &NewUser) -> Result<User> {
        let result = sqlx::query("INSERT INTO users (email, password) VALUES (?, ?)")
            .bind(&new_user.email)
            .bind(&new_user.password)
            .execute(self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                    DepotError::DuplicateEmail
                }
                other => DepotError::Database(other.to_string()),
            })?;

        let id = result.last_insert_rowid();
        self.get_by_id(id).await?.ok_or(DepotError::NotFound)
    }

    /// Get a user by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password, created_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(user)
    }

    /// Get a user by email (exact match).
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password, created_at FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await?;
        Ok(user)
    }

    /// Check if an email is already registered.
    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = ?)")
            .bind(email)
            .fetch_one(self.pool)
            .await?;
        Ok(exists)
    }

    /// Count all users.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    async fn setup_db() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get_user() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        let user = repo
            .create(&NewUser::new("a@x.com", "$argon2id$fake"))
            .await
            .unwrap();
        assert_eq!(user.email, "a@x.com");
        assert_eq!(user.password, "$argon2id$fake");

        let by_id = repo.get_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "a@x.com");

        let by_email = repo.get_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, user.id);
    }

    #[tokio::test]
    async fn test_email_is_case_sensitive() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        repo.create(&NewUser::new("a@x.com", "hash")).await.unwrap();

        assert!(repo.email_exists("a@x.com").await.unwrap());
        assert!(!repo.email_exists("A@X.com").await.unwrap());
        assert!(repo.get_by_email("A@X.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        repo.create(&NewUser::new("a@x.com", "hash")).await.unwrap();
        let result = repo.create(&NewUser::new("a@x.com", "other")).await;

        assert!(matches!(result, Err(DepotError::DuplicateEmail)));
    }

    #[tokio::test]
    async fn test_count() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        assert_eq!(repo.count().await.unwrap(), 0);
        repo.create(&NewUser::new("a@x.com", "hash")).await.unwrap();
        repo.create(&NewUser::new("b@x.com", "hash")).await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_get_nonexistent() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());
        assert!(repo.get_by_id(999).await.unwrap().is_none());
    }
}
