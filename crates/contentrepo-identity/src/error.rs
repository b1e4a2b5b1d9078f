//! Error types for identity operations.
//!
//! All failures from the user pool and identity pool are represented by
//! [`IdentityError`]. Rejected tokens are kept apart from every other service
//! failure so the HTTP handlers can answer 403 rather than 502.

/// Errors returned by [`UserDirectory`](crate::UserDirectory) and
/// [`IdentityFederation`](crate::IdentityFederation) implementations.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// The identity pool refused the presented token or role.
    #[error("{operation} not authorized: {message}")]
    NotAuthorized {
        /// The API operation that failed.
        operation: &'static str,
        /// Service-provided detail.
        message: String,
    },

    /// The service answered without a field the caller depends on.
    #[error("{operation} response is missing {field}")]
    MissingField {
        /// The API operation that returned the incomplete response.
        operation: &'static str,
        /// The absent field.
        field: &'static str,
    },

    /// Any other service or transport failure.
    #[error("{operation} failed: {message}")]
    Service {
        /// The API operation that failed.
        operation: &'static str,
        /// Service-provided detail.
        message: String,
    },
}

impl IdentityError {
    /// Whether the failure means the caller's token or role was rejected.
    #[must_use]
    pub fn is_not_authorized(&self) -> bool {
        matches!(self, Self::NotAuthorized { .. })
    }

    /// The API operation that failed.
    #[must_use]
    pub fn operation(&self) -> &'static str {
        match self {
            Self::NotAuthorized { operation, .. }
            | Self::MissingField { operation, .. }
            | Self::Service { operation, .. } => operation,
        }
    }
}
