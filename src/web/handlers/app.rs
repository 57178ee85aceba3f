//! Service health handlers.

use std::sync::Arc;

use axum::{extract::State, Json};

use crate::db::UserRepository;
use crate::web::dto::{StatsResponse, StatusResponse};
use crate::web::error::ApiError;

use super::AppState;

/// GET /status - Liveness of the backing stores.
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let (redis, db) = tokio::join!(
        state.authenticator.token_store().is_alive(),
        state.db.is_alive()
    );
    Json(StatusResponse { redis, db })
}

/// GET /stats - Number of users and file nodes.
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatsResponse>, ApiError> {
    let users = UserRepository::new(state.db.pool()).count().await?;
    let files = state.files.count().await?;
    Ok(Json(StatsResponse { users, files }))
}
