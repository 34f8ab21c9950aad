//! Request authentication.
//!
//! Every HTTP request carries `Authorization: Bearer <token>`. The
//! [`Authenticator`] turns the token into the caller's user ID, which the
//! nearby service then uses as the requester.

mod error;
mod token;

pub use error::{AuthError, AuthResult};
pub use token::{bearer_token, AccessToken, TokenAuthenticator, TOKEN_SECRET_LEN};

/// Maps a bearer token to a user ID.
pub trait Authenticator: Send + Sync {
    /// Returns the ID of the user the token belongs to.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidCredential`] if the token is malformed or unknown
    /// - [`AuthError::Storage`] if the credential store cannot be read
    fn authenticate(&self, token: &str) -> AuthResult<String>;
}
