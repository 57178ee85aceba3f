//! Session token extractors.
//!
//! Tokens travel in the `X-Token` header. They are resolved against the
//! token store on every request; nothing is cached between requests.

use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::DepotError;

/// Header carrying the session token.
pub const TOKEN_HEADER: &str = "x-token";

fn token_from_parts(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// Extractor for authenticated users.
///
/// Rejects with 401 if the token is missing, unknown, or expired.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Resolved user ID.
    pub user_id: i64,
    /// The token the request carried.
    pub token: String,
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        state: &'life1 Arc<AppState>,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let token = token_from_parts(parts).ok_or_else(ApiError::unauthorized)?;
            let user_id = state.authenticator.resolve_identity(&token).await?;
            Ok(AuthUser { user_id, token })
        })
    }
}

/// Optional authentication extractor.
///
/// Similar to AuthUser but yields `None` instead of failing when the token
/// is missing or unknown. Store failures are still errors.
#[derive(Debug, Clone)]
pub struct OptionalAuthUser(pub Option<i64>);

impl FromRequestParts<Arc<AppState>> for OptionalAuthUser {
    type Rejection = ApiError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        state: &'life1 Arc<AppState>,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let Some(token) = token_from_parts(parts) else {
                return Ok(OptionalAuthUser(None));
            };
            match state.authenticator.resolve_identity(&token).await {
                Ok(user_id) => Ok(OptionalAuthUser(Some(user_id))),
                Err(DepotError::UnknownToken) => Ok(OptionalAuthUser(None)),
                Err(e) => Err(e.into()),
            }
        })
    }
}
