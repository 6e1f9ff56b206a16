//! Error types for the nanit toolkit.
//!
//! A single error type with explicit variants for transport, authentication,
//! upstream, response-shape, input validation, flow-state and storage
//! failures. Callers match on the variant to decide whether to send the user
//! back to the login screen or show the raw message.

use std::fmt;
use thiserror::Error;

/// The unified error type for nanit operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Network transport errors (connection, timeout, client setup).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Authentication errors (no session, expired session, rejected token).
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// A non-401 failure reported by the vendor API.
    #[error("upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    /// A success status whose body lacks an expected field.
    #[error("invalid response: {message}")]
    InvalidResponse { message: String },

    /// Input validation errors (URL, baby uid, time range).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),

    /// A login flow operation was invoked in the wrong state.
    #[error("invalid state: {message}")]
    InvalidState { message: String },

    /// Token persistence failures.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl Error {
    /// Build an [`Error::InvalidResponse`].
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Error::InvalidResponse {
            message: message.into(),
        }
    }

    /// Build an [`Error::InvalidState`].
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Error::InvalidState {
            message: message.into(),
        }
    }

    /// Returns true if the vendor rejected the access token (HTTP 401).
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Error::Auth(AuthError::Unauthorized))
    }

    /// Returns true if the caller should be sent back to the login screen.
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            Error::Auth(AuthError::NotAuthenticated | AuthError::SessionExpired)
        )
    }
}

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },
}

/// Authentication-related errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No access token is stored locally.
    #[error("not authenticated")]
    NotAuthenticated,

    /// The token could not be refreshed, or was rejected again after refresh.
    #[error("session expired")]
    SessionExpired,

    /// The vendor rejected the access token (HTTP 401).
    #[error("unauthorized")]
    Unauthorized,
}

/// A non-401 failure response from the vendor API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamError {
    /// HTTP status code.
    pub status: u16,
    /// Error message from the vendor, if it sent one.
    pub message: Option<String>,
}

impl UpstreamError {
    /// Create a new upstream error.
    pub fn new(status: u16, message: Option<String>) -> Self {
        Self { status, message }
    }
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(ref message) = self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

impl std::error::Error for UpstreamError {}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid API base URL.
    #[error("invalid API URL '{value}': {reason}")]
    ApiUrl { value: String, reason: String },

    /// Invalid baby identifier.
    #[error("invalid baby uid '{value}': {reason}")]
    BabyUid { value: String, reason: String },

    /// Invalid time range.
    #[error("invalid time range {start}..{end}: {reason}")]
    TimeRange { start: i64, end: i64, reason: String },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}

/// Token storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing store failed.
    #[error("I/O error on {location}: {message}")]
    Io { location: String, message: String },

    /// The backing store held data that could not be decoded.
    #[error("corrupt token store {location}: {message}")]
    Corrupt { location: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_display_includes_message() {
        let err = UpstreamError::new(500, Some("Login failed".to_string()));
        assert_eq!(err.to_string(), "HTTP 500: Login failed");
        assert_eq!(UpstreamError::new(503, None).to_string(), "HTTP 503");
    }

    #[test]
    fn classifies_login_redirects() {
        assert!(Error::from(AuthError::SessionExpired).requires_login());
        assert!(Error::from(AuthError::NotAuthenticated).requires_login());
        assert!(!Error::from(AuthError::Unauthorized).requires_login());
        assert!(!Error::from(UpstreamError::new(500, None)).requires_login());
    }

    #[test]
    fn only_unauthorized_is_unauthorized() {
        assert!(Error::from(AuthError::Unauthorized).is_unauthorized());
        assert!(!Error::from(UpstreamError::new(403, None)).is_unauthorized());
        assert!(!Error::invalid_response("no token").is_unauthorized());
    }
}
