//! HTTP error mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::auth::AuthError;
use crate::nearby::NearbyError;

/// Error returned by request handlers.
///
/// Every error becomes a JSON body `{"error": "<message>"}`. Server-side
/// failures are logged and answered with a generic message.
#[derive(Error, Debug)]
pub enum ApiError {
    /// A service error; its variant decides the status code.
    #[error(transparent)]
    Nearby(#[from] NearbyError),

    /// A failure outside the service, such as a panicked blocking task.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self::Nearby(err.into())
    }
}

impl ApiError {
    /// Returns the status code this error is answered with.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Nearby(NearbyError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            Self::Nearby(NearbyError::Unauthorized) => StatusCode::UNAUTHORIZED,
            Self::Nearby(NearbyError::DataUnavailable(_) | NearbyError::Storage(_))
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = if status.is_server_error() {
            error!("Request failed: {self}");
            match self {
                Self::Nearby(NearbyError::DataUnavailable(_)) => "Nearby data unavailable",
                _ => "Internal server error",
            }
            .to_string()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;

    #[test]
    fn status_mapping() {
        assert_eq!(
            ApiError::from(NearbyError::InvalidInput("x".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(AuthError::MissingCredential).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(NearbyError::DataUnavailable("x".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(NearbyError::Storage(StoreError::Storage("x".into()))).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Internal("join".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn client_errors_keep_their_message() {
        let err = ApiError::from(NearbyError::InvalidInput("latitude is required".into()));
        assert_eq!(err.to_string(), "Invalid input: latitude is required");
    }
}
