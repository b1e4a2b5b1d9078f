//! Handler configuration.
//!
//! Each handler has its own configuration object, validated once at process
//! start. Loading collects every missing required variable before failing so
//! a misconfigured deployment reports all of its gaps in one error.
//!
//! Loading goes through a lookup function (`from_lookup`) so that tests can
//! supply a map instead of touching the process environment; `from_env` is
//! the thin wrapper used by the binaries.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::error::{CoreError, CoreResult};
use crate::types::{AwsRegion, GroupAssignment};

/// Default validity of a pre-signed upload URL, in seconds.
pub const DEFAULT_PRESIGN_EXPIRY_SECS: u64 = 3600;

/// Longest validity S3 accepts for a SigV4 pre-signed URL (seven days).
pub const MAX_PRESIGN_EXPIRY_SECS: u64 = 604_800;

/// Default log level filter.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// ---------------------------------------------------------------------------
// StorageAccessConfig
// ---------------------------------------------------------------------------

/// Configuration shared by the object listing and upload URL handlers.
///
/// # Examples
///
/// ```
/// use contentrepo_core::{AwsRegion, StorageAccessConfig};
///
/// let config = StorageAccessConfig::builder()
///     .bucket_name("content-bucket")
///     .allow_origins("https://app.example.com")
///     .region(AwsRegion::new("eu-central-1"))
///     .identity_pool_id("eu-central-1:1234")
///     .user_pool_id("eu-central-1_AbCdEf")
///     .build();
///
/// assert_eq!(
///     config.login_provider(),
///     "cognito-idp.eu-central-1.amazonaws.com/eu-central-1_AbCdEf"
/// );
/// assert_eq!(config.presign_expiry_secs, 3600);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct StorageAccessConfig {
    /// Bucket holding every group's objects.
    #[builder(setter(into))]
    pub bucket_name: String,

    /// Value of `Access-Control-Allow-Origin` on every response.
    #[builder(setter(into))]
    pub allow_origins: String,

    /// Region of the user pool, identity pool and bucket.
    pub region: AwsRegion,

    /// Cognito identity pool id.
    #[builder(setter(into))]
    pub identity_pool_id: String,

    /// Cognito user pool id; part of the login provider name.
    #[builder(setter(into))]
    pub user_pool_id: String,

    /// Validity of pre-signed upload URLs, in seconds.
    #[builder(default = DEFAULT_PRESIGN_EXPIRY_SECS)]
    pub presign_expiry_secs: u64,

    /// Custom S3 endpoint (for S3-compatible local stacks).
    #[builder(default, setter(strip_option, into))]
    pub endpoint_url: Option<String>,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from(DEFAULT_LOG_LEVEL), setter(into))]
    pub log_level: String,
}

impl StorageAccessConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Required | Default |
    /// |----------|----------|---------|
    /// | `SOURCE_BUCKET_NAME` (or `sourceBucketName`) | yes | |
    /// | `ALLOW_ORIGINS` (or `allowOrigins`) | yes | |
    /// | `REGION` (or `region`, then `AWS_REGION`) | yes | |
    /// | `IDENTITY_POOL_ID` (or `idPoolId`) | yes | |
    /// | `USER_POOL_ID` (or `userPoolId`) | yes | |
    /// | `PRESIGN_EXPIRY_SECONDS` | no | `3600` |
    /// | `S3_ENDPOINT_URL` | no | AWS default endpoint |
    /// | `LOG_LEVEL` | no | `info` |
    pub fn from_env() -> CoreResult<Self> {
        Self::from_lookup(env_lookup)
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> CoreResult<Self> {
        let mut vars = VarReader::new(lookup);

        let bucket_name = vars.required_any(&["SOURCE_BUCKET_NAME", "sourceBucketName"]);
        let allow_origins = vars.required_any(&["ALLOW_ORIGINS", "allowOrigins"]);
        let region = vars.required_any(&["REGION", "region", "AWS_REGION"]);
        let identity_pool_id = vars.required_any(&["IDENTITY_POOL_ID", "idPoolId"]);
        let user_pool_id = vars.required_any(&["USER_POOL_ID", "userPoolId"]);
        let presign_expiry = vars.optional("PRESIGN_EXPIRY_SECONDS");
        let endpoint_url = vars.optional("S3_ENDPOINT_URL");
        let log_level = vars.log_level();
        vars.finish()?;

        let presign_expiry_secs = match presign_expiry {
            Some(v) => parse_expiry(&v)?,
            None => DEFAULT_PRESIGN_EXPIRY_SECS,
        };

        Ok(Self {
            bucket_name,
            allow_origins,
            region: AwsRegion::new(region),
            identity_pool_id,
            user_pool_id,
            presign_expiry_secs,
            endpoint_url,
            log_level,
        })
    }

    /// Login provider name under which the ID token is presented to the
    /// identity pool.
    #[must_use]
    pub fn login_provider(&self) -> String {
        format!(
            "cognito-idp.{}.amazonaws.com/{}",
            self.region, self.user_pool_id
        )
    }

    /// Validity of pre-signed upload URLs.
    #[must_use]
    pub fn presign_expiry(&self) -> Duration {
        Duration::from_secs(self.presign_expiry_secs)
    }
}

fn parse_expiry(value: &str) -> CoreResult<u64> {
    let invalid = |reason: String| CoreError::InvalidVariable {
        name: "PRESIGN_EXPIRY_SECONDS".to_owned(),
        reason,
    };
    let secs = value
        .trim()
        .parse::<u64>()
        .map_err(|e| invalid(format!("{value:?} is not a whole number of seconds: {e}")))?;
    if secs == 0 || secs > MAX_PRESIGN_EXPIRY_SECS {
        return Err(invalid(format!(
            "{secs} is outside 1..={MAX_PRESIGN_EXPIRY_SECS}"
        )));
    }
    Ok(secs)
}

// ---------------------------------------------------------------------------
// ProvisionerConfig
// ---------------------------------------------------------------------------

/// Configuration of the user provisioning handler.
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionerConfig {
    /// Cognito user pool the users are created in.
    #[builder(setter(into))]
    pub user_pool_id: String,

    /// Users to create, in order.
    pub users: Vec<GroupAssignment>,

    /// Log level filter string.
    #[builder(default = String::from(DEFAULT_LOG_LEVEL), setter(into))]
    pub log_level: String,
}

impl ProvisionerConfig {
    /// Load configuration from environment variables.
    ///
    /// `USER_POOL_ID` and `USER_DATA` (a JSON array of
    /// `{"username", "password", "group"}` objects) are required. The
    /// camelCase names `userPoolId` and `userData` are read when those are
    /// unset.
    pub fn from_env() -> CoreResult<Self> {
        Self::from_lookup(env_lookup)
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> CoreResult<Self> {
        let mut vars = VarReader::new(lookup);

        let user_pool_id = vars.required_any(&["USER_POOL_ID", "userPoolId"]);
        let user_data = vars.required_any(&["USER_DATA", "userData"]);
        let log_level = vars.log_level();
        vars.finish()?;

        let users = serde_json::from_str(&user_data).map_err(|e| CoreError::InvalidVariable {
            name: "USER_DATA".to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            user_pool_id,
            users,
            log_level,
        })
    }
}

// ---------------------------------------------------------------------------
// ClaimsConfig
// ---------------------------------------------------------------------------

/// What to do when no group matches the caller's preferred role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnmatchedRolePolicy {
    /// Fail the invocation; Cognito then refuses to issue the token.
    #[default]
    Reject,
    /// Issue the token without a `department` claim.
    OmitClaim,
}

impl FromStr for UnmatchedRolePolicy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "omit" | "omit-claim" => Ok(Self::OmitClaim),
            other => Err(CoreError::InvalidVariable {
                name: "UNMATCHED_ROLE_POLICY".to_owned(),
                reason: format!("{other:?} is not one of \"reject\", \"omit\""),
            }),
        }
    }
}

/// Configuration of the claims augmenting handler.
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct ClaimsConfig {
    /// No-match policy for the group lookup.
    #[builder(default)]
    pub unmatched_role_policy: UnmatchedRolePolicy,

    /// Log level filter string.
    #[builder(default = String::from(DEFAULT_LOG_LEVEL), setter(into))]
    pub log_level: String,
}

impl ClaimsConfig {
    /// Load configuration from environment variables.
    ///
    /// `UNMATCHED_ROLE_POLICY` (`reject` or `omit`, default `reject`) and
    /// `LOG_LEVEL` are both optional.
    pub fn from_env() -> CoreResult<Self> {
        Self::from_lookup(env_lookup)
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> CoreResult<Self> {
        let vars = VarReader::new(lookup);
        let unmatched_role_policy = vars
            .optional("UNMATCHED_ROLE_POLICY")
            .map(|v| v.parse::<UnmatchedRolePolicy>())
            .transpose()?
            .unwrap_or_default();
        let log_level = vars.log_level();
        vars.finish()?;

        Ok(Self {
            unmatched_role_policy,
            log_level,
        })
    }
}

// ---------------------------------------------------------------------------
// Variable lookup
// ---------------------------------------------------------------------------

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Reads variables and remembers which required ones were absent.
struct VarReader<F> {
    lookup: F,
    missing: Vec<String>,
}

impl<F: Fn(&str) -> Option<String>> VarReader<F> {
    fn new(lookup: F) -> Self {
        Self {
            lookup,
            missing: Vec::new(),
        }
    }

    /// Blank values count as unset.
    fn optional(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|v| !v.trim().is_empty())
    }

    fn required(&mut self, name: &str) -> String {
        self.required_any(&[name])
    }

    /// First non-blank value among `names`; records the first name as missing.
    fn required_any(&mut self, names: &[&str]) -> String {
        if let Some(v) = names.iter().find_map(|n| self.optional(n)) {
            return v;
        }
        self.missing.push(names[0].to_owned());
        String::new()
    }

    fn log_level(&self) -> String {
        self.optional("LOG_LEVEL")
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_owned())
    }

    fn finish(self) -> CoreResult<()> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(CoreError::MissingVariables(self.missing))
        }
    }
}
