//! Object store seam.
//!
//! Handlers never hold long-lived storage credentials: every request obtains
//! temporary credentials scoped to the caller's group role and asks an
//! [`ObjectStoreFactory`] for a store bound to them.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use contentrepo_core::{GroupName, TemporaryCredential};

use crate::error::StorageError;

/// Parameters of a pre-signed `PutObject`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignedPut {
    /// Target bucket.
    pub bucket: String,
    /// Target key.
    pub key: String,
    /// Content type the uploader must send.
    pub content_type: String,
    /// Tag set (`k=v&k2=v2`) the uploader must send as `x-amz-tagging`.
    pub tagging: String,
    /// How long the URL stays valid.
    pub expires_in: Duration,
}

impl PresignedPut {
    /// Upload of `file_name` into `group`'s prefix, tagged with the group.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// use contentrepo_core::GroupName;
    /// use contentrepo_storage::PresignedPut;
    ///
    /// let group = GroupName::new("finance").unwrap();
    /// let put = PresignedPut::for_group(
    ///     "content",
    ///     &group,
    ///     "report.pdf",
    ///     "application/pdf",
    ///     Duration::from_secs(3600),
    /// );
    /// assert_eq!(put.key, "finance/report.pdf");
    /// assert_eq!(put.tagging, "Group=finance");
    /// ```
    #[must_use]
    pub fn for_group(
        bucket: impl Into<String>,
        group: &GroupName,
        file_name: &str,
        content_type: impl Into<String>,
        expires_in: Duration,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            key: group.upload_key(file_name),
            content_type: content_type.into(),
            tagging: group.tag(),
            expires_in,
        }
    }
}

/// Storage operations performed on behalf of one caller.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Every key in `bucket` starting with `prefix`, in the store's order.
    async fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, StorageError>;

    /// A URL allowing one `PutObject` described by `request`.
    async fn presign_put(&self, request: &PresignedPut) -> Result<String, StorageError>;
}

/// Builds [`ObjectStore`]s bound to temporary credentials.
pub trait ObjectStoreFactory: Send + Sync {
    /// A store whose requests are signed with `credential`.
    fn connect(&self, credential: &TemporaryCredential) -> Arc<dyn ObjectStore>;
}
