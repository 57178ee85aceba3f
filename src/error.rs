//! Error types for Depot.

use thiserror::Error;

/// Common error type for Depot.
///
/// Every core operation returns one of these kinds. The web layer is the
/// only place that turns them into status codes.
#[derive(Error, Debug)]
pub enum DepotError {
    /// A required field is absent from the request.
    #[error("Missing {0}")]
    MissingField(&'static str),

    /// The request could not be decoded.
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// Unknown email or wrong password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The session token is absent, expired, or was never issued.
    #[error("unknown token")]
    UnknownToken,

    /// The email is already registered.
    #[error("Already exist")]
    DuplicateEmail,

    /// The node does not exist or is not visible to the caller.
    #[error("Not found")]
    NotFound,

    /// The referenced parent does not exist.
    #[error("Parent not found")]
    ParentNotFound,

    /// The referenced parent is not a folder.
    #[error("Parent is not a folder")]
    ParentNotAFolder,

    /// Folders have no content to download.
    #[error("A folder doesn't have content")]
    NotDownloadable,

    /// Writing content to the byte store failed.
    #[error("storage write failed: {0}")]
    StorageWriteFailed(String),

    /// A backing store could not be reached.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Database error.
    ///
    /// Database errors from sqlx are automatically converted.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// A background task failed unexpectedly.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<tokio::task::JoinError> for DepotError {
    fn from(e: tokio::task::JoinError) -> Self {
        DepotError::Internal(e.to_string())
    }
}

impl From<sqlx::Error> for DepotError {
    fn from(e: sqlx::Error) -> Self {
        DepotError::Database(e.to_string())
    }
}

/// Result type alias for Depot operations.
pub type Result<T> = std::result::Result<T, DepotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_display() {
        assert_eq!(DepotError::MissingField("name").to_string(), "Missing name");
        assert_eq!(DepotError::MissingField("type").to_string(), "Missing type");
    }

    #[test]
    fn test_tree_error_display() {
        assert_eq!(DepotError::ParentNotFound.to_string(), "Parent not found");
        assert_eq!(
            DepotError::ParentNotAFolder.to_string(),
            "Parent is not a folder"
        );
        assert_eq!(
            DepotError::NotDownloadable.to_string(),
            "A folder doesn't have content"
        );
    }

    #[test]
    fn test_duplicate_email_display() {
        assert_eq!(DepotError::DuplicateEmail.to_string(), "Already exist");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: DepotError = io_err.into();
        assert!(matches!(err, DepotError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_sqlx_error_conversion() {
        let err: DepotError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, DepotError::Database(_)));
    }
}
