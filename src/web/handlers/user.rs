//! User handlers.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};

use crate::auth::register;
use crate::web::dto::{CreateUserRequest, UserResponse};
use crate::web::error::ApiError;
use crate::web::middleware::AuthUser;

use super::AppState;

/// POST /users - Register a new user.
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let user = register(&state.db, req.email.as_deref(), req.password.as_deref()).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// GET /users/me - The user owning the request's token.
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.authenticator.current_user(&auth.token).await?;
    Ok(Json(user.into()))
}
