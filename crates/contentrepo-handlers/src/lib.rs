//! Lambda handlers for a group-partitioned content repository.
//!
//! - [`UserProvisioner`] seeds the user pool with users and group memberships.
//! - [`ClaimsAugmenter`] is the pre-token-generation trigger that puts the
//!   user's group into the `department` claim.
//! - [`ObjectLister`] and [`UploadUrlIssuer`] are API Gateway handlers that
//!   exchange the caller's ID token for group-scoped credentials and then
//!   list, or pre-sign uploads into, the group's prefix.
//!
//! Handlers hold their clients behind traits so they can be built once per
//! process and swapped for in-memory implementations in tests.

pub mod access;
pub mod claims;
pub mod error;
pub mod http;
pub mod lister;
pub mod provisioner;
pub mod upload;

pub use access::StorageAccess;
pub use aws_lambda_events::apigw::{ApiGatewayProxyRequest, ApiGatewayProxyResponse};
pub use aws_lambda_events::cognito::CognitoEventUserPoolsPreTokenGen;
pub use claims::{ClaimsAugmenter, ClaimsError, preferred_role, resolve_group, set_claim};
pub use error::{ApiError, ApiErrorCode};
pub use http::{CorsHeaders, ProxyRequestExt, ProxyResponseExt};
pub use lister::{ObjectList, ObjectLister};
pub use provisioner::{ProvisionError, UserProvisioner};
pub use upload::{UploadGrant, UploadRequest, UploadUrlIssuer};
