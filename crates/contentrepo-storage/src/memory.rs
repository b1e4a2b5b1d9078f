//! In-memory [`ObjectStore`] for tests and local runs.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use contentrepo_core::TemporaryCredential;
use parking_lot::Mutex;

use crate::error::StorageError;
use crate::store::{ObjectStore, ObjectStoreFactory, PresignedPut};

#[derive(Debug, Default)]
struct Inner {
    buckets: Mutex<BTreeMap<String, BTreeSet<String>>>,
    presigned: Mutex<Vec<PresignedPut>>,
    connections: Mutex<Vec<String>>,
    fail_list: AtomicBool,
    fail_presign: AtomicBool,
}

/// Buckets of keys held in memory; clones share state.
///
/// Keys are listed in lexicographic order, as S3 does. Pre-signed URLs use
/// the `memory://` scheme and are only meaningful to assertions.
///
/// # Examples
///
/// ```
/// # tokio_test::block_on(async {
/// use contentrepo_storage::{MemoryObjectStore, ObjectStore};
///
/// let store = MemoryObjectStore::new()
///     .with_objects("content", ["finance/b.csv", "hr/c.csv", "finance/a.csv"]);
///
/// let keys = store.list_keys("content", "finance").await.unwrap();
/// assert_eq!(keys, vec!["finance/a.csv", "finance/b.csv"]);
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryObjectStore {
    inner: Arc<Inner>,
}

impl MemoryObjectStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `keys` to `bucket`.
    #[must_use]
    pub fn with_objects<I, K>(self, bucket: &str, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.inner
            .buckets
            .lock()
            .entry(bucket.to_owned())
            .or_default()
            .extend(keys.into_iter().map(Into::into));
        self
    }

    /// Make every listing fail.
    #[must_use]
    pub fn failing_list(self) -> Self {
        self.inner.fail_list.store(true, Ordering::Relaxed);
        self
    }

    /// Make every pre-sign request fail.
    #[must_use]
    pub fn failing_presign(self) -> Self {
        self.inner.fail_presign.store(true, Ordering::Relaxed);
        self
    }

    /// Pre-sign requests received so far.
    #[must_use]
    pub fn presigned(&self) -> Vec<PresignedPut> {
        self.inner.presigned.lock().clone()
    }

    /// Access key ids of the credentials each connection was made with.
    #[must_use]
    pub fn connections(&self) -> Vec<String> {
        self.inner.connections.lock().clone()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, StorageError> {
        if self.inner.fail_list.load(Ordering::Relaxed) {
            return Err(StorageError::List {
                bucket: bucket.to_owned(),
                prefix: prefix.to_owned(),
                message: "AccessDenied: Access Denied".to_owned(),
            });
        }
        let buckets = self.inner.buckets.lock();
        let Some(keys) = buckets.get(bucket) else {
            return Err(StorageError::List {
                bucket: bucket.to_owned(),
                prefix: prefix.to_owned(),
                message: "NoSuchBucket: The specified bucket does not exist".to_owned(),
            });
        };
        Ok(keys
            .iter()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn presign_put(&self, request: &PresignedPut) -> Result<String, StorageError> {
        if self.inner.fail_presign.load(Ordering::Relaxed) {
            return Err(StorageError::Presign {
                bucket: request.bucket.clone(),
                key: request.key.clone(),
                message: "credential provider returned no credentials".to_owned(),
            });
        }
        self.inner.presigned.lock().push(request.clone());
        Ok(format!(
            "memory://{}/{}?X-Amz-Expires={}",
            request.bucket,
            request.key,
            request.expires_in.as_secs()
        ))
    }
}

impl ObjectStoreFactory for MemoryObjectStore {
    fn connect(&self, credential: &TemporaryCredential) -> Arc<dyn ObjectStore> {
        self.inner
            .connections
            .lock()
            .push(credential.access_key_id.clone());
        Arc::new(self.clone())
    }
}
