//! End-to-end handler tests with an in-memory identity pool and a real
//! S3-compatible store.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use contentrepo_core::{AwsRegion, StorageAccessConfig};
    use contentrepo_handlers::{
        ApiGatewayProxyRequest, ObjectLister, ProxyResponseExt, StorageAccess, UploadUrlIssuer,
    };
    use contentrepo_identity::StaticFederation;
    use serde_json::json;

    use crate::{
        TEST_REGION, cleanup_bucket, create_test_bucket, endpoint_url, s3_client, store_factory,
    };

    fn access(bucket: &str) -> Arc<StorageAccess> {
        let config = StorageAccessConfig::builder()
            .bucket_name(bucket)
            .allow_origins("http://localhost:3000")
            .region(AwsRegion::new(TEST_REGION))
            .identity_pool_id("us-east-1:pool")
            .user_pool_id("us-east-1_Pool")
            .endpoint_url(endpoint_url())
            .build();
        let federation = StaticFederation::new().with_identity("finance-token", "us-east-1:alice");
        Arc::new(
            StorageAccess::new(config, Arc::new(federation), Arc::new(store_factory())).unwrap(),
        )
    }

    fn request(body: Option<&str>) -> ApiGatewayProxyRequest {
        serde_json::from_value(json!({
            "httpMethod": if body.is_some() { "POST" } else { "GET" },
            "headers": {"Authorization": "finance-token"},
            "requestContext": {
                "httpMethod": if body.is_some() { "POST" } else { "GET" },
                "authorizer": {"claims": {
                    "department": "finance",
                    "cognito:preferred_role": "arn:aws:iam::000000000000:role/finance"
                }}
            },
            "body": body
        }))
        .unwrap()
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_list_group_objects_end_to_end() {
        let client = s3_client();
        let bucket =
            create_test_bucket(&client, "lister", &["finance/a.csv", "finance/b.csv", "hr/c.csv"])
                .await;

        let resp = ObjectLister::new(access(&bucket)).handle(&request(None)).await;

        assert_eq!(resp.status_code, 200);
        assert_eq!(
            resp.json_value(),
            Some(json!({"objectLists": ["finance/a.csv", "finance/b.csv"]}))
        );

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_issue_usable_upload_url_end_to_end() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "issuer", &[]).await;

        let resp = UploadUrlIssuer::new(access(&bucket))
            .handle(&request(Some(r#"{"fileName":"q3.csv","fileType":"text/csv"}"#)))
            .await;
        assert_eq!(resp.status_code, 200);
        let body = resp.json_value().unwrap();
        assert_eq!(body["group"], "finance");
        let url = body["preSignedUrl"].as_str().unwrap().to_owned();

        let upload = reqwest::Client::new()
            .put(&url)
            .header("Content-Type", "text/csv")
            .header("x-amz-tagging", "Group=finance")
            .body("a,b\n1,2\n")
            .send()
            .await
            .expect("upload");
        assert!(upload.status().is_success());

        let listed = ObjectLister::new(access(&bucket)).handle(&request(None)).await;
        assert_eq!(listed.json_value(), Some(json!({"objectLists": ["finance/q3.csv"]})));

        cleanup_bucket(&client, &bucket).await;
    }
}
