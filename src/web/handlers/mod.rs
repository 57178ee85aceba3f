//! API handlers.

pub mod app;
pub mod auth;
pub mod file;
pub mod user;

pub use app::*;
pub use auth::*;
pub use file::*;
pub use user::*;

use crate::auth::Authenticator;
use crate::file::FileTreeManager;
use crate::Database;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Metadata store.
    pub db: Database,
    /// Token lifecycle and identity resolution.
    pub authenticator: Authenticator,
    /// File tree operations.
    pub files: FileTreeManager,
}

impl AppState {
    /// Create a new application state.
    pub fn new(db: Database, authenticator: Authenticator, files: FileTreeManager) -> Self {
        Self {
            db,
            authenticator,
            files,
        }
    }
}
