//! Depot - multi-user file metadata and storage service
//!
//! Users register, log in for a session token, and keep a private tree of
//! folders and files. Files can be published for anonymous download.
//! Uploaded images get thumbnails generated in the background.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod file;
pub mod jobs;
pub mod logging;
pub mod web;

pub use auth::{
    hash_password, register, validate_password, verify_password, Authenticator, Credentials,
    MemoryTokenStore, PasswordError, SqliteTokenStore, TokenStore,
};
pub use config::{Config, TokenBackend};
pub use db::{Database, NewUser, User, UserRepository};
pub use error::{DepotError, Result};
pub use file::{ByteStore, DiskByteStore, FileNode, FileTreeManager, NodeType};
pub use jobs::{JobDispatcher, JobWorker};
pub use web::{AppState, WebServer};
