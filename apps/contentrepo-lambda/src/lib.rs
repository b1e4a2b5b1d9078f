//! Shared start-up code for the Lambda entry points.
//!
//! Every binary loads and validates its configuration, initializes tracing,
//! and builds its AWS clients once before handing control to the Lambda
//! runtime. A configuration error fails the cold start instead of the first
//! invocation.
//!
//! # Environment Variables
//!
//! | Variable | Used by | Description |
//! |----------|---------|-------------|
//! | `USER_POOL_ID` | provision-users, list-objects, presign-upload | Cognito user pool id |
//! | `USER_DATA` | provision-users | JSON array of users to create |
//! | `UNMATCHED_ROLE_POLICY` | pre-token-generation | `reject` (default) or `omit` |
//! | `SOURCE_BUCKET_NAME` | list-objects, presign-upload | Content bucket |
//! | `ALLOW_ORIGINS` | list-objects, presign-upload | CORS allowed origin |
//! | `REGION` | list-objects, presign-upload | Falls back to `AWS_REGION` |
//!
//! The required variables are also read under their camelCase names
//! (`userPoolId`, `userData`, `sourceBucketName`, `allowOrigins`, `region`,
//! `idPoolId`) when the upper-case name is unset.
//! | `IDENTITY_POOL_ID` | list-objects, presign-upload | Cognito identity pool id |
//! | `PRESIGN_EXPIRY_SECONDS` | presign-upload | Upload URL validity, default `3600` |
//! | `S3_ENDPOINT_URL` | list-objects, presign-upload | Custom S3 endpoint |
//! | `LOG_LEVEL` | all | Log level filter, default `info` |
//! | `RUST_LOG` | all | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use std::sync::Arc;

use anyhow::{Context, Result};
use aws_config::{BehaviorVersion, Region, SdkConfig};
use contentrepo_core::StorageAccessConfig;
use contentrepo_handlers::StorageAccess;
use contentrepo_identity::CognitoFederation;
use contentrepo_storage::S3StoreFactory;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber with JSON output for CloudWatch.
///
/// Uses `RUST_LOG` if set, otherwise falls back to `log_level`.
///
/// # Errors
///
/// Returns an error if `log_level` is not a valid filter.
pub fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    Ok(())
}

/// Load the shared AWS configuration from the Lambda environment.
pub async fn load_aws_config() -> SdkConfig {
    aws_config::load_defaults(BehaviorVersion::latest()).await
}

/// Build the clients shared by the listing and upload handlers.
///
/// The identity pool client uses the configured region; storage clients are
/// built per request from the exchanged credentials.
///
/// # Errors
///
/// Returns an error if the allowed origin is not a valid header value.
pub async fn build_storage_access(config: StorageAccessConfig) -> Result<StorageAccess> {
    let sdk_config = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(config.region.as_str().to_owned()))
        .load()
        .await;
    let federation = CognitoFederation::new(aws_sdk_cognitoidentity::Client::new(&sdk_config));
    let stores = S3StoreFactory::new(config.region.clone(), config.endpoint_url.clone());

    info!(
        bucket = %config.bucket_name,
        region = %config.region,
        endpoint = ?config.endpoint_url,
        presign_expiry_secs = config.presign_expiry_secs,
        "storage access configured"
    );
    StorageAccess::new(config, Arc::new(federation), Arc::new(stores))
        .context("ALLOW_ORIGINS is not a valid header value")
}

/// Load the storage handler configuration and initialize tracing.
///
/// # Errors
///
/// Returns an error naming every missing or invalid variable.
pub fn storage_access_config() -> Result<StorageAccessConfig> {
    let config =
        StorageAccessConfig::from_env().context("failed to load storage access configuration")?;
    init_tracing(&config.log_level)?;
    Ok(config)
}
