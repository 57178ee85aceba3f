//! Router configuration for the HTTP API.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;

use super::handlers::{
    connect, create_user, disconnect, get_file, get_file_data, get_me, get_stats, get_status,
    list_files, publish_file, unpublish_file, upload_file, AppState,
};
use super::middleware::create_cors_layer;

/// Create the main API router.
pub fn create_router(app_state: Arc<AppState>, config: &ServerConfig) -> Router {
    let max_body = config.max_body_bytes();

    let app_routes = Router::new()
        .route("/status", get(get_status))
        .route("/stats", get(get_stats));

    let user_routes = Router::new()
        .route("/users", post(create_user))
        .route("/users/me", get(get_me))
        .route("/connect", get(connect))
        .route("/disconnect", get(disconnect));

    let file_routes = Router::new()
        .route("/files", post(upload_file).get(list_files))
        .route("/files/:id", get(get_file))
        .route("/files/:id/publish", put(publish_file))
        .route("/files/:id/unpublish", put(unpublish_file))
        .route("/files/:id/data", get(get_file_data));

    Router::new()
        .merge(app_routes)
        .merge(user_routes)
        .merge(file_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(&config.cors_origins))
                .layer(DefaultBodyLimit::max(max_body)),
        )
        .with_state(app_state)
}
