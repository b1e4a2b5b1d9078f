//! API Gateway handler listing the caller's group objects.

use contentrepo_handlers::{ApiGatewayProxyRequest, ObjectLister};
use contentrepo_lambda::{build_storage_access, storage_access_config};
use lambda_runtime::{Error, LambdaEvent, run, service_fn};
use tracing::{Instrument, info_span};

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = storage_access_config()?;
    let lister = ObjectLister::new(build_storage_access(config).await?.into());

    run(service_fn(|event: LambdaEvent<ApiGatewayProxyRequest>| {
        let span = info_span!("list_objects", request_id = %event.context.request_id);
        let lister = &lister;
        async move { Ok::<_, Error>(lister.handle(&event.payload).await) }.instrument(span)
    }))
    .await
}
