//! Group-scoped object storage.
//!
//! The handlers touch S3 in exactly two ways: listing the keys under a
//! group's prefix and pre-signing a tagged upload into it. [`ObjectStore`]
//! captures both; [`ObjectStoreFactory`] builds a store bound to the
//! temporary credentials issued for one request.
//!
//! [`S3StoreFactory`] is the production implementation and
//! [`MemoryObjectStore`] the in-memory one used by tests.

pub mod error;
pub mod memory;
pub mod s3;
pub mod store;

pub use error::StorageError;
pub use memory::MemoryObjectStore;
pub use s3::{S3ObjectStore, S3StoreFactory};
pub use store::{ObjectStore, ObjectStoreFactory, PresignedPut};
