//! Middleware for the HTTP API.

pub mod auth;
pub mod cors;

pub use auth::{AuthUser, OptionalAuthUser, TOKEN_HEADER};
pub use cors::create_cors_layer;
