//! HTTP API for Depot.
//!
//! A thin transport over the core: handlers decode requests, call the
//! authenticator or the file tree manager, and map [`crate::DepotError`]
//! to status codes through [`ApiError`].

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use router::create_router;
pub use server::WebServer;
