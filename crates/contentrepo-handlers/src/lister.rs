//! Lists the objects of the caller's group.

use std::sync::Arc;

use aws_lambda_events::apigw::{ApiGatewayProxyRequest, ApiGatewayProxyResponse};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::access::StorageAccess;
use crate::error::ApiError;
use crate::http::{ProxyRequestExt, error_to_response, json_response};

/// Body of a successful listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectList {
    /// Keys under the caller's group prefix, in the order S3 returns them.
    pub object_lists: Vec<String>,
}

/// HTTP handler returning every key under the caller's group prefix.
#[derive(Debug, Clone)]
pub struct ObjectLister {
    access: Arc<StorageAccess>,
}

impl ObjectLister {
    /// Create a lister sharing `access`.
    #[must_use]
    pub fn new(access: Arc<StorageAccess>) -> Self {
        Self { access }
    }

    /// Handle one proxy request. Failures become error responses.
    pub async fn handle(&self, request: &ApiGatewayProxyRequest) -> ApiGatewayProxyResponse {
        let cors = self.access.cors();
        match self.list(request).await {
            Ok(list) => json_response(http::StatusCode::OK, &list, cors),
            Err(e) => {
                warn!(
                    code = %e.code,
                    source = ?e.source,
                    request_id = ?request.request_context.request_id,
                    "list objects failed"
                );
                error_to_response(&e, cors)
            }
        }
    }

    /// List the caller's objects.
    ///
    /// # Errors
    ///
    /// Fails on missing claims or token, a rejected credential exchange, or
    /// a failed listing. Nothing is listed unless the exchange succeeds.
    pub async fn list(&self, request: &ApiGatewayProxyRequest) -> Result<ObjectList, ApiError> {
        let claims = request.identity_claims()?;
        let id_token = request.id_token()?;

        let store = self.access.store_for(&claims, id_token).await?;
        let prefix = claims.group.prefix();
        let mut keys = store
            .list_keys(&self.access.config().bucket_name, prefix)
            .await?;
        keys.retain(|k| k.starts_with(prefix));

        info!(group = %claims.group, count = keys.len(), "listed group objects");
        Ok(ObjectList { object_lists: keys })
    }
}
