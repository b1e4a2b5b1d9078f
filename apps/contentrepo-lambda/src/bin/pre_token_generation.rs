//! Cognito pre-token-generation trigger adding the `department` claim.

use std::sync::Arc;

use anyhow::Context;
use contentrepo_core::ClaimsConfig;
use contentrepo_handlers::{ClaimsAugmenter, CognitoEventUserPoolsPreTokenGen};
use contentrepo_identity::CognitoDirectory;
use contentrepo_lambda::{init_tracing, load_aws_config};
use lambda_runtime::{Error, LambdaEvent, run, service_fn};
use tracing::{Instrument, error, info_span};

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = ClaimsConfig::from_env().context("failed to load claims configuration")?;
    init_tracing(&config.log_level)?;

    let sdk_config = load_aws_config().await;
    let directory = CognitoDirectory::new(aws_sdk_cognitoidentityprovider::Client::new(&sdk_config));
    let augmenter = ClaimsAugmenter::new(Arc::new(directory), config);

    run(service_fn(|event: LambdaEvent<CognitoEventUserPoolsPreTokenGen>| {
        let span = info_span!("pre_token_generation", request_id = %event.context.request_id);
        let augmenter = &augmenter;
        async move {
            augmenter.handle(event.payload).await.map_err(|e| {
                error!(error = %e, "refusing to issue token");
                Error::from(e)
            })
        }
        .instrument(span)
    }))
    .await
}
