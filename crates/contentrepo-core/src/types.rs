//! Value types passed through a single handler invocation.

use std::fmt;

use chrono::{DateTime, Utc};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Characters left unencoded in tag values: the URI unreserved set.
const TAG_VALUE_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// AWS Region identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AwsRegion(String);

impl AwsRegion {
    /// Create a new region.
    #[must_use]
    pub fn new(region: impl Into<String>) -> Self {
        Self(region.into())
    }

    /// Get the region as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AwsRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Name of a user pool group.
///
/// The group name doubles as the object key prefix that confines every
/// storage operation performed on behalf of a member of the group.
///
/// # Examples
///
/// ```
/// use contentrepo_core::GroupName;
///
/// let group = GroupName::new("finance").unwrap();
/// assert_eq!(group.upload_key("report.pdf"), "finance/report.pdf");
/// assert_eq!(group.tag(), "Group=finance");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GroupName(String);

impl GroupName {
    /// Create a group name.
    ///
    /// # Errors
    /// Returns [`CoreError::EmptyGroupName`] if the name is empty.
    pub fn new(name: impl Into<String>) -> CoreResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(CoreError::EmptyGroupName);
        }
        Ok(Self(name))
    }

    /// Get the group name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key prefix used when listing the group's objects.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.0
    }

    /// Object key for an upload of `file_name` into this group.
    #[must_use]
    pub fn upload_key(&self, file_name: &str) -> String {
        format!("{}/{file_name}", self.0)
    }

    /// Object tag attached to uploads, evaluated by downstream IAM policies.
    ///
    /// The value is percent-encoded, as S3 parses the tag set as a query
    /// string.
    #[must_use]
    pub fn tag(&self) -> String {
        format!("Group={}", utf8_percent_encode(&self.0, TAG_VALUE_ENCODE_SET))
    }
}

impl TryFrom<String> for GroupName {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<GroupName> for String {
    fn from(value: GroupName) -> Self {
        value.0
    }
}

impl fmt::Display for GroupName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// IAM role ARN associated with a user pool group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoleArn(String);

impl RoleArn {
    /// Create a role ARN.
    ///
    /// # Errors
    /// Returns [`CoreError::EmptyRoleArn`] if the value is empty.
    pub fn new(arn: impl Into<String>) -> CoreResult<Self> {
        let arn = arn.into();
        if arn.is_empty() {
            return Err(CoreError::EmptyRoleArn);
        }
        Ok(Self(arn))
    }

    /// Get the ARN as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RoleArn {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RoleArn> for String {
    fn from(value: RoleArn) -> Self {
        value.0
    }
}

impl fmt::Display for RoleArn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A user to create in the user pool and the group it joins.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupAssignment {
    /// Username in the user pool.
    pub username: String,
    /// Temporary password; the user must change it on first sign-in.
    pub password: String,
    /// Group the user is added to.
    pub group: GroupName,
}

impl fmt::Debug for GroupAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupAssignment")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("group", &self.group)
            .finish()
    }
}

/// Verified claims taken from the caller's ID token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityClaims {
    /// The `department` claim: the caller's resolved group.
    pub group: GroupName,
    /// The `cognito:preferred_role` claim.
    pub preferred_role: RoleArn,
}

/// Short-lived storage credentials issued by the identity pool.
#[derive(Clone, PartialEq, Eq)]
pub struct TemporaryCredential {
    /// Access key id.
    pub access_key_id: String,
    /// Secret access key.
    pub secret_key: String,
    /// Session token.
    pub session_token: String,
    /// When the credentials stop being valid, if reported.
    pub expiration: Option<DateTime<Utc>>,
}

impl fmt::Debug for TemporaryCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemporaryCredential")
            .field("access_key_id", &self.access_key_id)
            .field("secret_key", &"<redacted>")
            .field("session_token", &"<redacted>")
            .field("expiration", &self.expiration)
            .finish()
    }
}
