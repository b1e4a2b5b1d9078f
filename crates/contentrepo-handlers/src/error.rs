//! Error type shared by the HTTP handlers.
//!
//! Every failure of the object listing and upload URL handlers becomes an
//! [`ApiError`]: an error code, a message safe to show the caller, and the
//! HTTP status it is answered with. The JSON body is
//! `{"code": "...", "message": "..."}`.

use std::fmt;

use contentrepo_identity::IdentityError;
use contentrepo_storage::StorageError;

/// Error codes returned by the HTTP handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ApiErrorCode {
    /// Required claims or the ID token are missing from the request.
    Unauthorized,
    /// The request body is missing or malformed.
    BadRequest,
    /// The identity pool rejected the caller's token or role.
    AccessDenied,
    /// A downstream AWS service failed.
    UpstreamFailure,
    /// The handler itself failed.
    InternalError,
}

impl ApiErrorCode {
    /// Returns the error code string used in the JSON body.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthorized => "Unauthorized",
            Self::BadRequest => "BadRequest",
            Self::AccessDenied => "AccessDenied",
            Self::UpstreamFailure => "UpstreamFailure",
            Self::InternalError => "InternalError",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> http::StatusCode {
        match self {
            Self::Unauthorized => http::StatusCode::UNAUTHORIZED,
            Self::BadRequest => http::StatusCode::BAD_REQUEST,
            Self::AccessDenied => http::StatusCode::FORBIDDEN,
            Self::UpstreamFailure => http::StatusCode::BAD_GATEWAY,
            Self::InternalError => http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ApiErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed HTTP handler invocation.
#[derive(Debug)]
pub struct ApiError {
    /// The error code.
    pub code: ApiErrorCode,
    /// A message safe to return to the caller.
    pub message: String,
    /// The HTTP status code.
    pub status_code: http::StatusCode,
    /// The underlying source error, if any. Logged, never returned.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiError({}): {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl ApiError {
    /// Create a new `ApiError` with a custom message.
    #[must_use]
    pub fn with_message(code: ApiErrorCode, message: impl Into<String>) -> Self {
        Self {
            status_code: code.status_code(),
            message: message.into(),
            code,
            source: None,
        }
    }

    /// Set the source error.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // -- Convenience constructors --

    /// Missing claims or token.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::with_message(ApiErrorCode::Unauthorized, message)
    }

    /// Malformed request.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::with_message(ApiErrorCode::BadRequest, message)
    }

    /// Handler failure.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::with_message(ApiErrorCode::InternalError, message)
    }

    /// The JSON body returned to the caller.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "code": self.code.as_str(),
            "message": self.message,
        })
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        let api = if err.is_not_authorized() {
            Self::with_message(
                ApiErrorCode::AccessDenied,
                "the identity pool rejected the supplied token",
            )
        } else {
            Self::with_message(
                ApiErrorCode::UpstreamFailure,
                "could not obtain storage credentials",
            )
        };
        api.with_source(err)
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        let api = match err {
            StorageError::List { .. } => {
                Self::with_message(ApiErrorCode::UpstreamFailure, "could not list objects")
            }
            StorageError::Presign { .. } => Self::internal("could not create upload URL"),
        };
        api.with_source(err)
    }
}
