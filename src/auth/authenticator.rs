//! Token issuing, revocation and identity resolution.

use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::password::verify_password;
use super::token_store::TokenStore;
use crate::db::{Database, User, UserRepository};
use crate::{DepotError, Result};

/// Default token lifetime (24 hours).
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 24 * 60 * 60;

/// Token store key for a session token.
fn token_key(token: &str) -> String {
    format!("auth_{token}")
}

/// Login credentials decoded from a Basic authorization envelope.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Login email.
    pub email: String,
    /// Plaintext password. Never logged.
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Create credentials from an email and password.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Decode an `Authorization: Basic <base64(email:password)>` header value.
    ///
    /// A header that is not Basic, is not valid base64/UTF-8, or has no
    /// `:` separator is [`DepotError::MalformedRequest`]. An empty email or
    /// password decodes fine but can never match, so it is reported as
    /// [`DepotError::InvalidCredentials`].
    pub fn from_basic_header(header: &str) -> Result<Self> {
        let encoded = header
            .strip_prefix("Basic ")
            .ok_or_else(|| DepotError::MalformedRequest("expected Basic authorization".into()))?;

        let decoded = STANDARD
            .decode(encoded.trim())
            .map_err(|_| DepotError::MalformedRequest("invalid base64 credentials".into()))?;
        let decoded = String::from_utf8(decoded)
            .map_err(|_| DepotError::MalformedRequest("credentials are not UTF-8".into()))?;

        let (email, password) = decoded
            .split_once(':')
            .ok_or_else(|| DepotError::MalformedRequest("missing ':' in credentials".into()))?;

        if email.is_empty() || password.is_empty() {
            return Err(DepotError::InvalidCredentials);
        }

        Ok(Self::new(email, password))
    }
}

/// Owns the session token lifecycle.
///
/// Tokens are opaque UUIDs bound to a user id in the token store with a
/// fixed TTL. Identity is resolved against the store on every call.
#[derive(Clone)]
pub struct Authenticator {
    db: Database,
    tokens: Arc<dyn TokenStore>,
    ttl: Duration,
}

impl Authenticator {
    /// Create an authenticator with the default 24 hour token lifetime.
    pub fn new(db: Database, tokens: Arc<dyn TokenStore>) -> Self {
        Self::with_ttl(db, tokens, Duration::from_secs(DEFAULT_TOKEN_TTL_SECS))
    }

    /// Create an authenticator with a custom token lifetime.
    pub fn with_ttl(db: Database, tokens: Arc<dyn TokenStore>, ttl: Duration) -> Self {
        Self { db, tokens, ttl }
    }

    /// The underlying token store.
    pub fn token_store(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    /// Token lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Verify credentials and issue a new session token.
    pub async fn issue_token(&self, credentials: &Credentials) -> Result<String> {
        let user = UserRepository::new(self.db.pool())
            .get_by_email(&credentials.email)
            .await?
            .ok_or_else(|| {
                debug!(email = %credentials.email, "Login for unknown email");
                DepotError::InvalidCredentials
            })?;

        let password = credentials.password.clone();
        let hash = user.password.clone();
        tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await?
            .map_err(|_| {
                debug!(user_id = user.id, "Login with wrong password");
                DepotError::InvalidCredentials
            })?;

        let token = Uuid::new_v4().to_string();
        self.tokens.set(&token_key(&token), user.id, self.ttl).await?;

        info!(user_id = user.id, "Session token issued");
        Ok(token)
    }

    /// Revoke a token immediately, regardless of its remaining TTL.
    pub async fn revoke_token(&self, token: &str) -> Result<()> {
        if self.tokens.delete(&token_key(token)).await? {
            info!("Session token revoked");
            Ok(())
        } else {
            Err(DepotError::UnknownToken)
        }
    }

    /// Resolve a token to the bound user id.
    pub async fn resolve_identity(&self, token: &str) -> Result<i64> {
        if token.is_empty() {
            return Err(DepotError::UnknownToken);
        }
        self.tokens
            .get(&token_key(token))
            .await?
            .ok_or(DepotError::UnknownToken)
    }

    /// Resolve a token to the full user record.
    ///
    /// A token bound to a user that no longer exists is treated as unknown.
    pub async fn current_user(&self, token: &str) -> Result<User> {
        let user_id = self.resolve_identity(token).await?;
        UserRepository::new(self.db.pool())
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| {
                warn!(user_id, "Token bound to a missing user");
                DepotError::UnknownToken
            })
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("backend", &self.tokens.backend_name())
            .field("ttl", &self.ttl)
            .finish()
    }
}
