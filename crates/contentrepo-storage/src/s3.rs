//! [`ObjectStore`] on top of the S3 SDK.

use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use contentrepo_core::{AwsRegion, TemporaryCredential};
use tracing::debug;

use crate::error::StorageError;
use crate::store::{ObjectStore, ObjectStoreFactory, PresignedPut};

/// Provider name attached to credentials obtained from the identity pool.
const CREDENTIAL_PROVIDER_NAME: &str = "cognito-identity";

/// S3-backed object store.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    /// Wrap an SDK client.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, StorageError> {
        let mut keys = Vec::new();
        let mut continuation_token = None;
        loop {
            let resp = self
                .client
                .list_objects_v2()
                .bucket(bucket)
                .prefix(prefix)
                .set_continuation_token(continuation_token.take())
                .send()
                .await
                .map_err(|e| StorageError::List {
                    bucket: bucket.to_owned(),
                    prefix: prefix.to_owned(),
                    message: DisplayErrorContext(&e).to_string(),
                })?;

            keys.extend(
                resp.contents()
                    .iter()
                    .filter_map(|obj| obj.key())
                    .map(ToOwned::to_owned),
            );

            if resp.is_truncated() == Some(true) {
                continuation_token = resp.next_continuation_token().map(ToOwned::to_owned);
                if continuation_token.is_none() {
                    break;
                }
            } else {
                break;
            }
        }

        debug!(bucket, prefix, count = keys.len(), "listed objects");
        Ok(keys)
    }

    async fn presign_put(&self, request: &PresignedPut) -> Result<String, StorageError> {
        let presign_error = |message: String| StorageError::Presign {
            bucket: request.bucket.clone(),
            key: request.key.clone(),
            message,
        };

        let presigning = PresigningConfig::expires_in(request.expires_in)
            .map_err(|e| presign_error(e.to_string()))?;

        let presigned = self
            .client
            .put_object()
            .bucket(&request.bucket)
            .key(&request.key)
            .content_type(&request.content_type)
            .tagging(&request.tagging)
            .presigned(presigning)
            .await
            .map_err(|e| presign_error(DisplayErrorContext(&e).to_string()))?;

        debug!(
            bucket = %request.bucket,
            key = %request.key,
            expires_in_secs = request.expires_in.as_secs(),
            "pre-signed upload"
        );
        Ok(presigned.uri().to_owned())
    }
}

/// Builds [`S3ObjectStore`]s signed with per-request credentials.
#[derive(Debug, Clone)]
pub struct S3StoreFactory {
    region: AwsRegion,
    endpoint_url: Option<String>,
}

impl S3StoreFactory {
    /// Stores in `region`, optionally against a custom endpoint.
    ///
    /// A custom endpoint switches to path-style addressing, which
    /// S3-compatible local stacks expect.
    #[must_use]
    pub fn new(region: AwsRegion, endpoint_url: Option<String>) -> Self {
        Self {
            region,
            endpoint_url,
        }
    }

    /// An SDK client signing with `credential`.
    #[must_use]
    pub fn client(&self, credential: &TemporaryCredential) -> Client {
        let creds = Credentials::new(
            &credential.access_key_id,
            &credential.secret_key,
            Some(credential.session_token.clone()),
            credential.expiration.map(SystemTime::from),
            CREDENTIAL_PROVIDER_NAME,
        );

        let mut builder = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(self.region.as_str().to_owned()))
            .credentials_provider(creds);
        if let Some(endpoint) = &self.endpoint_url {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Client::from_conf(builder.build())
    }
}

impl ObjectStoreFactory for S3StoreFactory {
    fn connect(&self, credential: &TemporaryCredential) -> Arc<dyn ObjectStore> {
        Arc::new(S3ObjectStore::new(self.client(credential)))
    }
}
