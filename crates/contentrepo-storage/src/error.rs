//! Error types for storage operations.

/// Errors returned by [`ObjectStore`](crate::ObjectStore) implementations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Listing objects under a prefix failed.
    #[error("failed to list s3://{bucket}/{prefix}*: {message}")]
    List {
        /// Bucket being listed.
        bucket: String,
        /// Key prefix being listed.
        prefix: String,
        /// Service-provided detail.
        message: String,
    },

    /// Generating a pre-signed URL failed.
    #[error("failed to pre-sign upload of s3://{bucket}/{key}: {message}")]
    Presign {
        /// Target bucket.
        bucket: String,
        /// Target key.
        key: String,
        /// Failure detail.
        message: String,
    },
}
