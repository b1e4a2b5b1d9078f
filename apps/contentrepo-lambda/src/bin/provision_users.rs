//! Creates the configured users and adds each to its group.
//!
//! Invoked once by the stack's custom resource; answers `true` when every
//! user was provisioned and `false` otherwise.

use std::sync::Arc;

use anyhow::Context;
use contentrepo_core::ProvisionerConfig;
use contentrepo_handlers::UserProvisioner;
use contentrepo_identity::CognitoDirectory;
use contentrepo_lambda::{init_tracing, load_aws_config};
use lambda_runtime::{Error, LambdaEvent, run, service_fn};
use tracing::{Instrument, info_span};

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = ProvisionerConfig::from_env().context("failed to load provisioner configuration")?;
    init_tracing(&config.log_level)?;

    let sdk_config = load_aws_config().await;
    let directory = CognitoDirectory::new(aws_sdk_cognitoidentityprovider::Client::new(&sdk_config));
    let provisioner = UserProvisioner::new(Arc::new(directory), config);

    run(service_fn(|event: LambdaEvent<serde_json::Value>| {
        let span = info_span!("provision_users", request_id = %event.context.request_id);
        let provisioner = &provisioner;
        async move { Ok::<bool, Error>(provisioner.run().await) }.instrument(span)
    }))
    .await
}
