//! Mapping from proxy failures to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use nanit_core::Error;
use nanit_core::error::AuthError;
use nanit_http::endpoints::ErrorResponse;

/// Failures surfaced to proxy clients as `{"error": ...}` bodies.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// No usable `Authorization` header on a data request.
    #[error("Unauthorized")]
    MissingToken,

    /// The request itself is malformed.
    #[error("{0}")]
    BadRequest(String),

    /// The vendor call failed.
    #[error(transparent)]
    Vendor(#[from] Error),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingToken => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Vendor(Error::Auth(_)) => StatusCode::UNAUTHORIZED,
            Self::Vendor(Error::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            Self::Vendor(Error::Storage(_) | Error::InvalidState { .. }) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Vendor(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Vendor(Error::Auth(AuthError::Unauthorized | AuthError::SessionExpired)) => {
                "Session expired".to_string()
            }
            Self::Vendor(Error::Upstream(e)) => e
                .message
                .clone()
                .unwrap_or_else(|| format!("Nanit API error: HTTP {}", e.status)),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(error = %self, %status, "Proxy request failed");
        } else {
            tracing::debug!(error = %self, %status, "Proxy request rejected");
        }
        (status, Json(ErrorResponse::new(self.message()))).into_response()
    }
}
