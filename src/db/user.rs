//! User model for Depot.

/// A registered user.
///
/// Users are immutable after registration and never deleted.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// Unique user ID.
    pub id: i64,
    /// Login email (unique, case-sensitive as stored).
    pub email: String,
    /// Password hash (Argon2 PHC string).
    pub password: String,
    /// Account creation timestamp.
    pub created_at: String,
}

/// Data for creating a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Login email.
    pub email: String,
    /// Password hash, never the plaintext.
    pub password: String,
}

impl NewUser {
    /// Create a new user record from an email and an already-hashed password.
    pub fn new(email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password_hash.into(),
        }
    }
}
