//! Cognito user pool and identity pool access.
//!
//! Two seams cover every identity call the handlers make:
//!
//! - [`UserDirectory`]: user pool administration (create user, add to group,
//!   list groups), implemented by [`CognitoDirectory`].
//! - [`IdentityFederation`]: the identity pool's token-for-credentials
//!   exchange, implemented by [`CognitoFederation`] and driven by
//!   [`CredentialExchange`].
//!
//! [`StaticDirectory`] and [`StaticFederation`] are in-memory
//! implementations for tests and local development.

pub mod directory;
pub mod error;
pub mod federation;
pub mod memory;

pub use directory::{CognitoDirectory, DirectoryGroup, GroupPage, UserDirectory};
pub use error::IdentityError;
pub use federation::{CognitoFederation, CredentialExchange, IdentityFederation, Login};
pub use memory::{DirectoryCall, StaticDirectory, StaticFederation};
