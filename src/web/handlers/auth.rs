//! Session handlers.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    Json,
};

use crate::auth::Credentials;
use crate::web::dto::TokenResponse;
use crate::web::error::ApiError;
use crate::web::middleware::AuthUser;

use super::AppState;

/// GET /connect - Exchange Basic credentials for a session token.
pub async fn connect(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, ApiError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or_else(ApiError::unauthorized)?
        .to_str()
        .map_err(|_| ApiError::bad_request("Invalid authorization header"))?;

    let credentials = Credentials::from_basic_header(header)?;
    let token = state.authenticator.issue_token(&credentials).await?;
    Ok(Json(TokenResponse { token }))
}

/// GET /disconnect - Revoke the request's session token.
pub async fn disconnect(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<StatusCode, ApiError> {
    state.authenticator.revoke_token(&auth.token).await?;
    Ok(StatusCode::NO_CONTENT)
}
