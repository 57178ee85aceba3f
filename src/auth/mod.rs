//! Authentication module for Depot.
//!
//! This module provides password hashing, user registration, the session
//! token store and the authenticator that ties them together.

mod authenticator;
mod password;
mod registration;
mod token_store;

pub use authenticator::{Authenticator, Credentials, DEFAULT_TOKEN_TTL_SECS};
pub use password::{
    hash_password, validate_password, verify_password, PasswordError, MAX_PASSWORD_LENGTH,
};
pub use registration::register;
pub use token_store::{MemoryTokenStore, SqliteTokenStore, TokenStore};
