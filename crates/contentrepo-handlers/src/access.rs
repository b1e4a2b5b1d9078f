//! Per-request storage access shared by the HTTP handlers.

use std::fmt;
use std::sync::Arc;

use contentrepo_core::{IdentityClaims, StorageAccessConfig};
use contentrepo_identity::{CredentialExchange, IdentityFederation};
use contentrepo_storage::{ObjectStore, ObjectStoreFactory};
use http::header::InvalidHeaderValue;
use tracing::warn;

use crate::error::ApiError;
use crate::http::CorsHeaders;

/// Clients and settings built once per process and reused by every
/// invocation of the listing and upload handlers.
pub struct StorageAccess {
    config: StorageAccessConfig,
    federation: Arc<dyn IdentityFederation>,
    stores: Arc<dyn ObjectStoreFactory>,
    exchange: CredentialExchange,
    cors: CorsHeaders,
}

impl fmt::Debug for StorageAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageAccess")
            .field("config", &self.config)
            .field("exchange", &self.exchange)
            .finish_non_exhaustive()
    }
}

impl StorageAccess {
    /// Bundle the clients with their configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the allowed origin cannot be sent as a header.
    pub fn new(
        config: StorageAccessConfig,
        federation: Arc<dyn IdentityFederation>,
        stores: Arc<dyn ObjectStoreFactory>,
    ) -> Result<Self, InvalidHeaderValue> {
        let exchange =
            CredentialExchange::new(config.identity_pool_id.clone(), config.login_provider());
        let cors = CorsHeaders::new(&config.allow_origins)?;
        Ok(Self {
            config,
            federation,
            stores,
            exchange,
            cors,
        })
    }

    /// The handler configuration.
    #[must_use]
    pub fn config(&self) -> &StorageAccessConfig {
        &self.config
    }

    /// CORS headers for every response.
    #[must_use]
    pub fn cors(&self) -> &CorsHeaders {
        &self.cors
    }

    /// A store signed with credentials for the caller's preferred role.
    ///
    /// # Errors
    ///
    /// Returns `AccessDenied` when the identity pool rejects the token or
    /// role, and `UpstreamFailure` for any other exchange failure.
    pub async fn store_for(
        &self,
        claims: &IdentityClaims,
        id_token: &str,
    ) -> Result<Arc<dyn ObjectStore>, ApiError> {
        let credential = self
            .exchange
            .exchange(self.federation.as_ref(), &claims.preferred_role, id_token)
            .await
            .map_err(|e| {
                warn!(
                    group = %claims.group,
                    role = %claims.preferred_role,
                    error = %e,
                    "credential exchange failed"
                );
                ApiError::from(e)
            })?;
        Ok(self.stores.connect(&credential))
    }
}
