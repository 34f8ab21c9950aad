//! Error types for authentication.

use thiserror::Error;

use crate::store::StoreError;

/// Errors that can occur while authenticating a request.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No bearer credential was supplied.
    #[error("Missing credential")]
    MissingCredential,

    /// The credential is malformed, unknown or revoked.
    #[error("Invalid credential")]
    InvalidCredential,

    /// A token cannot be issued for this user ID.
    #[error("Invalid user ID: {0}")]
    InvalidUserId(String),

    /// Credential storage failed.
    #[error("Credential storage error: {0}")]
    Storage(#[from] StoreError),
}

/// Result type for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;
