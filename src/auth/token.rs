//! Bearer access tokens.
//!
//! A token reads `<user_id>.<secret>`, where the secret is 32 random bytes
//! encoded as unpadded base64url. Only the SHA-256 digest of the secret is
//! stored, so a leaked database does not reveal usable tokens.

use std::fmt;
use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tracing::{debug, info};
use zeroize::{ZeroizeOnDrop, Zeroizing};

use super::error::{AuthError, AuthResult};
use super::Authenticator;
use crate::store::CredentialStore;

/// Number of random bytes in a token secret.
pub const TOKEN_SECRET_LEN: usize = 32;

const SEPARATOR: char = '.';

/// A freshly issued access token.
///
/// The token text is zeroized on drop. It is only available once, at issue
/// time; the store keeps a digest.
#[derive(ZeroizeOnDrop)]
pub struct AccessToken {
    value: String,
}

impl AccessToken {
    /// Returns the full token, suitable for an `Authorization: Bearer` header.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"[REDACTED]")
            .finish()
    }
}

/// Authenticates bearer tokens against stored digests.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use nearby_core::auth::{Authenticator, TokenAuthenticator};
/// use nearby_core::store::SqliteStore;
///
/// let dir = tempfile::tempdir().unwrap();
/// let store = Arc::new(SqliteStore::new(&dir.path().join("nearby.db")).unwrap());
/// let auth = TokenAuthenticator::new(store);
///
/// let token = auth.issue_token("alice").unwrap();
/// assert_eq!(auth.authenticate(token.as_str()).unwrap(), "alice");
/// assert!(auth.authenticate("alice.forged").is_err());
/// ```
pub struct TokenAuthenticator {
    store: Arc<dyn CredentialStore>,
}

impl TokenAuthenticator {
    /// Creates an authenticator over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Issues a new token for `user_id`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidUserId`] if the ID is empty or contains whitespace
    /// - [`AuthError::Storage`] if the digest cannot be saved
    pub fn issue_token(&self, user_id: &str) -> AuthResult<AccessToken> {
        if user_id.is_empty() || user_id.chars().any(char::is_whitespace) {
            return Err(AuthError::InvalidUserId(user_id.to_string()));
        }

        let mut secret_bytes = Zeroizing::new([0u8; TOKEN_SECRET_LEN]);
        OsRng.fill_bytes(&mut *secret_bytes);
        let secret = Zeroizing::new(URL_SAFE_NO_PAD.encode(&*secret_bytes));

        self.store.save_token_digest(user_id, &secret_digest(&secret))?;
        info!(user_id, "Issued access token");

        Ok(AccessToken {
            value: format!("{user_id}{SEPARATOR}{}", secret.as_str()),
        })
    }
}

impl Authenticator for TokenAuthenticator {
    fn authenticate(&self, token: &str) -> AuthResult<String> {
        // The base64url alphabet has no '.', so the last one ends the user ID.
        let (user_id, secret) = token
            .rsplit_once(SEPARATOR)
            .ok_or(AuthError::InvalidCredential)?;
        if user_id.is_empty() || secret.is_empty() {
            return Err(AuthError::InvalidCredential);
        }

        let Some(stored) = self.store.token_digest(user_id)? else {
            debug!(user_id, "No token on record");
            return Err(AuthError::InvalidCredential);
        };

        let presented = secret_digest(secret);
        if presented.as_bytes().ct_eq(stored.as_bytes()).into() {
            Ok(user_id.to_string())
        } else {
            debug!(user_id, "Token digest mismatch");
            Err(AuthError::InvalidCredential)
        }
    }
}

/// Extracts the token from an `Authorization` header value.
///
/// # Errors
///
/// - [`AuthError::MissingCredential`] if there is no header
/// - [`AuthError::InvalidCredential`] if it is not a non-empty bearer token
pub fn bearer_token(header: Option<&str>) -> AuthResult<&str> {
    let header = header.ok_or(AuthError::MissingCredential)?;
    let (scheme, token) = header
        .trim()
        .split_once(' ')
        .ok_or(AuthError::InvalidCredential)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidCredential);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::InvalidCredential);
    }
    Ok(token)
}

fn secret_digest(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}
