//! API Gateway handler issuing pre-signed upload URLs.

use contentrepo_handlers::{ApiGatewayProxyRequest, UploadUrlIssuer};
use contentrepo_lambda::{build_storage_access, storage_access_config};
use lambda_runtime::{Error, LambdaEvent, run, service_fn};
use tracing::{Instrument, info_span};

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = storage_access_config()?;
    let issuer = UploadUrlIssuer::new(build_storage_access(config).await?.into());

    run(service_fn(|event: LambdaEvent<ApiGatewayProxyRequest>| {
        let span = info_span!("presign_upload", request_id = %event.context.request_id);
        let issuer = &issuer;
        async move { Ok::<_, Error>(issuer.handle(&event.payload).await) }.instrument(span)
    }))
    .await
}
