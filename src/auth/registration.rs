//! User registration for Depot.

use tracing::info;

use super::password::{hash_password, PasswordError};
use crate::db::{Database, NewUser, User, UserRepository};
use crate::{DepotError, Result};

/// Register a new user.
///
/// This function:
/// 1. Checks that email and password are present
/// 2. Checks that the email is not already registered
/// 3. Hashes the password off the async executor
/// 4. Creates the user in the database
///
/// Fields are taken as `Option` so that the caller can pass through what
/// the request carried and get the field-specific `Missing ...` error.
pub async fn register(db: &Database, email: Option<&str>, password: Option<&str>) -> Result<User> {
    let email = email
        .filter(|e| !e.is_empty())
        .ok_or(DepotError::MissingField("email"))?;
    let password = password
        .filter(|p| !p.is_empty())
        .ok_or(DepotError::MissingField("password"))?;

    let repo = UserRepository::new(db.pool());
    if repo.email_exists(email).await? {
        return Err(DepotError::DuplicateEmail);
    }

    let password = password.to_string();
    let hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await?
        .map_err(|e| match e {
            PasswordError::TooLong => DepotError::MalformedRequest(e.to_string()),
            other => DepotError::Internal(other.to_string()),
        })?;

    // The unique index still guards against a concurrent registration
    let user = repo.create(&NewUser::new(email, hash)).await?;
    info!(user_id = user.id, "Registered new user");

    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::verify_password;

    #[tokio::test]
    async fn test_register_success() {
        let db = Database::open_in_memory().await.unwrap();
        let user = register(&db, Some("a@x.com"), Some("pw1")).await.unwrap();

        assert_eq!(user.email, "a@x.com");
        assert_ne!(user.password, "pw1");
        assert!(verify_password("pw1", &user.password).is_ok());
    }

    #[tokio::test]
    async fn test_register_missing_fields() {
        let db = Database::open_in_memory().await.unwrap();

        assert!(matches!(
            register(&db, None, Some("pw1")).await,
            Err(DepotError::MissingField("email"))
        ));
        assert!(matches!(
            register(&db, Some(""), Some("pw1")).await,
            Err(DepotError::MissingField("email"))
        ));
        assert!(matches!(
            register(&db, Some("a@x.com"), None).await,
            Err(DepotError::MissingField("password"))
        ));
    }

    #[tokio::test]
    async fn test_register_duplicate() {
        let db = Database::open_in_memory().await.unwrap();
        register(&db, Some("a@x.com"), Some("pw1")).await.unwrap();

        assert!(matches!(
            register(&db, Some("a@x.com"), Some("pw2")).await,
            Err(DepotError::DuplicateEmail)
        ));
    }

    #[tokio::test]
    async fn test_register_password_too_long() {
        let db = Database::open_in_memory().await.unwrap();
        let long = "a".repeat(200);
        assert!(matches!(
            register(&db, Some("a@x.com"), Some(&long)).await,
            Err(DepotError::MalformedRequest(_))
        ));
    }
}
