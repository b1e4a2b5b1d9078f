//! Object store integration tests.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use contentrepo_core::GroupName;
    use contentrepo_storage::{ObjectStoreFactory, PresignedPut};

    use crate::{cleanup_bucket, create_test_bucket, s3_client, store_factory, test_credential};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_list_keys_under_group_prefix() {
        let client = s3_client();
        let bucket = create_test_bucket(
            &client,
            "list",
            &["finance/a.csv", "finance/b.csv", "hr/c.csv", "financed.txt"],
        )
        .await;

        let store = store_factory().connect(&test_credential());
        let keys = store.list_keys(&bucket, "finance/").await.expect("list_keys");

        assert_eq!(keys, vec!["finance/a.csv", "finance/b.csv"]);

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_list_keys_across_result_pages() {
        let client = s3_client();
        let mut names: Vec<String> = (0..1005).map(|i| format!("finance/{i:04}.csv")).collect();
        names.push("hr/c.csv".to_owned());
        let keys: Vec<&str> = names.iter().map(String::as_str).collect();
        let bucket = create_test_bucket(&client, "paged", &keys).await;

        let store = store_factory().connect(&test_credential());
        let listed = store.list_keys(&bucket, "finance/").await.expect("list_keys");

        assert_eq!(listed.len(), 1005);
        assert_eq!(listed, names[..1005]);

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_list_nothing_for_empty_prefix_match() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "empty", &["hr/c.csv"]).await;

        let store = store_factory().connect(&test_credential());
        let keys = store.list_keys(&bucket, "finance").await.expect("list_keys");

        assert!(keys.is_empty());

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_fail_listing_missing_bucket() {
        let store = store_factory().connect(&test_credential());
        let result = store
            .list_keys(&crate::test_bucket_name("missing"), "finance")
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_upload_tagged_object_with_presigned_url() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "presign", &[]).await;
        let group = GroupName::new("finance").unwrap();
        let put = PresignedPut::for_group(
            bucket.clone(),
            &group,
            "report.pdf",
            "application/pdf",
            Duration::from_secs(300),
        );

        let store = store_factory().connect(&test_credential());
        let url = store.presign_put(&put).await.expect("presign_put");

        let resp = reqwest::Client::new()
            .put(&url)
            .header("Content-Type", "application/pdf")
            .header("x-amz-tagging", "Group=finance")
            .body("%PDF-1.7")
            .send()
            .await
            .expect("upload");
        assert!(resp.status().is_success(), "upload failed: {}", resp.status());

        let head = client
            .head_object()
            .bucket(&bucket)
            .key("finance/report.pdf")
            .send()
            .await
            .expect("head_object");
        assert_eq!(head.content_type(), Some("application/pdf"));

        let tagging = client
            .get_object_tagging()
            .bucket(&bucket)
            .key("finance/report.pdf")
            .send()
            .await
            .expect("get_object_tagging");
        let tags: Vec<_> = tagging
            .tag_set()
            .iter()
            .map(|t| (t.key().to_owned(), t.value().to_owned()))
            .collect();
        assert_eq!(tags, vec![("Group".to_owned(), "finance".to_owned())]);

        cleanup_bucket(&client, &bucket).await;
    }
}
