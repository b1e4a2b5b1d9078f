//! Core types, configuration, and errors shared by the contentrepo handlers.
//!
//! The handlers mediate access to a single S3 bucket partitioned by user pool
//! group: every key a caller can list or upload starts with the caller's group
//! name. This crate holds the values that flow through one invocation
//! ([`GroupName`], [`IdentityClaims`], [`TemporaryCredential`], ...) and the
//! per-handler configuration objects validated at process start.

mod config;
mod error;
mod types;

pub use config::{
    ClaimsConfig, DEFAULT_LOG_LEVEL, DEFAULT_PRESIGN_EXPIRY_SECS, MAX_PRESIGN_EXPIRY_SECS,
    ProvisionerConfig, StorageAccessConfig, UnmatchedRolePolicy,
};
pub use error::{CoreError, CoreResult};
pub use types::{AwsRegion, GroupAssignment, GroupName, IdentityClaims, RoleArn, TemporaryCredential};
