//! Issues pre-signed upload URLs into the caller's group prefix.

use std::sync::Arc;

use aws_lambda_events::apigw::{ApiGatewayProxyRequest, ApiGatewayProxyResponse};
use contentrepo_storage::PresignedPut;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::access::StorageAccess;
use crate::error::ApiError;
use crate::http::{ProxyRequestExt, error_to_response, json_response};

/// Body of an upload request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    /// Object name below the group prefix.
    pub file_name: String,
    /// Content type the upload will carry.
    pub file_type: String,
}

impl UploadRequest {
    fn validate(&self) -> Result<(), ApiError> {
        if self.file_name.trim().is_empty() {
            return Err(ApiError::bad_request("fileName must not be empty"));
        }
        if self.file_type.trim().is_empty() {
            return Err(ApiError::bad_request("fileType must not be empty"));
        }
        Ok(())
    }
}

/// Body of a successful upload grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadGrant {
    /// URL accepting one `PUT` of the object.
    ///
    /// The uploader must send the same `Content-Type` and an
    /// `x-amz-tagging: Group=<group>` header, both of which are signed. The
    /// group in the tag is percent-encoded.
    pub pre_signed_url: String,
    /// The caller's group.
    pub group: String,
}

/// HTTP handler issuing pre-signed `PUT` URLs.
#[derive(Debug, Clone)]
pub struct UploadUrlIssuer {
    access: Arc<StorageAccess>,
}

impl UploadUrlIssuer {
    /// Create an issuer sharing `access`.
    #[must_use]
    pub fn new(access: Arc<StorageAccess>) -> Self {
        Self { access }
    }

    /// Handle one proxy request. Failures become error responses.
    pub async fn handle(&self, request: &ApiGatewayProxyRequest) -> ApiGatewayProxyResponse {
        let cors = self.access.cors();
        match self.issue(request).await {
            Ok(grant) => json_response(http::StatusCode::OK, &grant, cors),
            Err(e) => {
                warn!(
                    code = %e.code,
                    source = ?e.source,
                    request_id = ?request.request_context.request_id,
                    "issue upload url failed"
                );
                error_to_response(&e, cors)
            }
        }
    }

    /// Pre-sign an upload of the requested file into the caller's group.
    ///
    /// # Errors
    ///
    /// Fails on missing claims or token, a malformed body, a rejected
    /// credential exchange, or a pre-signing failure.
    pub async fn issue(&self, request: &ApiGatewayProxyRequest) -> Result<UploadGrant, ApiError> {
        let claims = request.identity_claims()?;
        let id_token = request.id_token()?;
        let upload: UploadRequest = request.json_body()?;
        upload.validate()?;

        let store = self.access.store_for(&claims, id_token).await?;
        let config = self.access.config();
        let put = PresignedPut::for_group(
            config.bucket_name.clone(),
            &claims.group,
            &upload.file_name,
            upload.file_type,
            config.presign_expiry(),
        );
        let pre_signed_url = store.presign_put(&put).await?;

        info!(
            group = %claims.group,
            key = %put.key,
            expires_in_secs = put.expires_in.as_secs(),
            "issued upload url"
        );
        Ok(UploadGrant {
            pre_signed_url,
            group: claims.group.to_string(),
        })
    }
}
