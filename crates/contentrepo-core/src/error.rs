//! Error types for the contentrepo core.

/// Core error type for configuration and value validation.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A group name was empty.
    #[error("group name must not be empty")]
    EmptyGroupName,

    /// A role ARN was empty.
    #[error("role ARN must not be empty")]
    EmptyRoleArn,

    /// One or more required environment variables are unset or empty.
    #[error("missing required configuration: {}", .0.join(", "))]
    MissingVariables(Vec<String>),

    /// An environment variable was present but could not be parsed.
    #[error("invalid value for {name}: {reason}")]
    InvalidVariable {
        /// The variable name.
        name: String,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Convenience result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
