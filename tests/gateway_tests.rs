use bytes::Bytes;
use futures::TryStreamExt;
use s3_rest_api::{
    create_in_memory_app,
    domain::models::{CONTENT_TYPE_METADATA_KEY, ORIGINAL_FILENAME_METADATA_KEY},
    AppServices, BucketName, GatewayError, ObjectKey, StorageGateway, UploadRequest,
};
use std::collections::HashMap;

fn bucket(name: &str) -> BucketName {
    BucketName::new(name).unwrap()
}

fn key(name: &str) -> ObjectKey {
    ObjectKey::new(name).unwrap()
}

async fn services_with_bucket(name: &str) -> AppServices {
    let services = create_in_memory_app().await.unwrap();
    services
        .gateway
        .create_bucket(&bucket(name), "us-east-1")
        .await
        .unwrap();
    services
}

fn upload_request(bucket_name: &str, key_name: &str, content: &'static [u8]) -> UploadRequest {
    UploadRequest::builder()
        .bucket(bucket(bucket_name))
        .key(key(key_name))
        .content(Bytes::from_static(content))
        .content_type("text/plain")
        .original_filename(key_name)
        .build()
}

#[tokio::test]
async fn upload_then_head_reports_size_and_etag() {
    let services = services_with_bucket("b1").await;

    let uploaded = services
        .gateway
        .upload_object(upload_request("b1", "hello.txt", b"hello world"))
        .await
        .unwrap();
    assert_eq!(uploaded.size, 11);
    assert!(!uploaded.etag.is_empty());

    let head = services
        .gateway
        .head_object(&bucket("b1"), &key("hello.txt"))
        .await
        .unwrap();
    assert_eq!(head.size, 11);
    assert!(!head.etag.is_empty());
    assert_eq!(head.content_type.as_deref(), Some("text/plain"));
}

#[tokio::test]
async fn uploaded_metadata_keeps_reserved_and_caller_entries() {
    let services = services_with_bucket("b1").await;

    let request = UploadRequest::builder()
        .bucket(bucket("b1"))
        .key(key("a.txt"))
        .content(Bytes::from_static(b"alice's file"))
        .content_type("text/plain")
        .original_filename("a.txt")
        .metadata(HashMap::from([("owner".to_string(), "alice".to_string())]))
        .build();
    services.gateway.upload_object(request).await.unwrap();

    let head = services
        .gateway
        .head_object(&bucket("b1"), &key("a.txt"))
        .await
        .unwrap();

    assert_eq!(head.user_metadata["owner"], "alice");
    assert_eq!(head.user_metadata[CONTENT_TYPE_METADATA_KEY], "text/plain");
    assert_eq!(head.user_metadata[ORIGINAL_FILENAME_METADATA_KEY], "a.txt");
    assert!(head.access_url.is_some_and(|url| !url.is_empty()));
}

#[tokio::test]
async fn caller_metadata_overrides_reserved_entries() {
    let services = services_with_bucket("b1").await;

    let request = UploadRequest::builder()
        .bucket(bucket("b1"))
        .key(key("a.txt"))
        .content(Bytes::from_static(b"data"))
        .content_type("text/plain")
        .original_filename("a.txt")
        .metadata(HashMap::from([(
            ORIGINAL_FILENAME_METADATA_KEY.to_string(),
            "renamed.txt".to_string(),
        )]))
        .build();
    let uploaded = services.gateway.upload_object(request).await.unwrap();

    assert_eq!(
        uploaded.user_metadata[ORIGINAL_FILENAME_METADATA_KEY],
        "renamed.txt"
    );
}

#[tokio::test]
async fn list_returns_exactly_the_uploaded_keys() {
    let services = services_with_bucket("b1").await;
    let keys = ["one.txt", "two.txt", "nested/three.txt"];

    for name in keys {
        services
            .gateway
            .upload_object(upload_request("b1", name, b"x"))
            .await
            .unwrap();
    }

    let mut listed = services
        .gateway
        .list_object_keys(&bucket("b1"))
        .await
        .unwrap();
    listed.sort();

    let mut expected: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
    expected.sort();
    assert_eq!(listed, expected);
}

#[tokio::test]
async fn missing_key_is_not_found_everywhere() {
    let services = services_with_bucket("b1").await;
    let gateway = &services.gateway;

    let err = gateway
        .head_object(&bucket("b1"), &key("missing.txt"))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::NotFound { .. }));

    let err = gateway
        .download_object(&bucket("b1"), &key("missing.txt"))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::NotFound { .. }));

    let err = gateway
        .delete_object(&bucket("b1"), &key("missing.txt"))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::NotFound { .. }));
}

#[tokio::test]
async fn deleted_key_is_not_found() {
    let services = services_with_bucket("b1").await;
    let gateway = &services.gateway;

    gateway
        .upload_object(upload_request("b1", "gone.txt", b"bye"))
        .await
        .unwrap();
    gateway
        .delete_object(&bucket("b1"), &key("gone.txt"))
        .await
        .unwrap();

    let err = gateway
        .delete_object(&bucket("b1"), &key("gone.txt"))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::NotFound { .. }));
}

#[tokio::test]
async fn download_streams_the_content() {
    let services = services_with_bucket("b1").await;
    services
        .gateway
        .upload_object(upload_request("b1", "a.txt", b"streamed content"))
        .await
        .unwrap();

    let content = services
        .gateway
        .download_object(&bucket("b1"), &key("a.txt"))
        .await
        .unwrap();
    assert_eq!(content.content_length, Some(16));

    let chunks: Vec<Bytes> = content.stream.try_collect().await.unwrap();
    assert_eq!(chunks.concat(), b"streamed content");
}

#[tokio::test]
async fn create_bucket_twice_fails() {
    let services = services_with_bucket("b1").await;

    let err = services
        .gateway
        .create_bucket(&bucket("b1"), "us-east-1")
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::BucketAlreadyExists { .. }));
}

#[tokio::test]
async fn created_bucket_reports_zero_stats() {
    let services = create_in_memory_app().await.unwrap();

    let info = services
        .gateway
        .create_bucket(&bucket("fresh"), "eu-central-1")
        .await
        .unwrap();
    assert_eq!(info.name, "fresh");
    assert_eq!(info.region, "eu-central-1");
    assert_eq!(info.total_size, 0);
    assert_eq!(info.object_count, 0);
}

#[tokio::test]
async fn list_buckets_aggregates_stats() {
    let services = services_with_bucket("b1").await;
    services
        .gateway
        .create_bucket(&bucket("b2"), "eu-west-1")
        .await
        .unwrap();
    services
        .gateway
        .upload_object(upload_request("b1", "a.txt", b"12345"))
        .await
        .unwrap();
    services
        .gateway
        .upload_object(upload_request("b1", "b.txt", b"678"))
        .await
        .unwrap();

    let buckets = services.gateway.list_buckets().await.unwrap();
    assert_eq!(buckets.len(), 2);

    let b1 = buckets.iter().find(|b| b.name == "b1").unwrap();
    assert_eq!(b1.region, "us-east-1");
    assert_eq!(b1.total_size, 8);
    assert_eq!(b1.object_count, 2);

    let b2 = buckets.iter().find(|b| b.name == "b2").unwrap();
    assert_eq!(b2.region, "eu-west-1");
    assert_eq!(b2.object_count, 0);
}

#[tokio::test]
async fn delete_bucket_removes_objects_and_bucket() {
    let services = services_with_bucket("b1").await;
    services
        .gateway
        .upload_object(upload_request("b1", "a.txt", b"data"))
        .await
        .unwrap();

    services.gateway.delete_bucket(&bucket("b1")).await.unwrap();

    assert!(services.gateway.list_buckets().await.unwrap().is_empty());
    let err = services
        .gateway
        .list_object_keys(&bucket("b1"))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::BucketNotFound { .. }));
}

#[tokio::test]
async fn delete_missing_bucket_is_not_found() {
    let services = create_in_memory_app().await.unwrap();

    let err = services
        .gateway
        .delete_bucket(&bucket("nowhere"))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::BucketNotFound { .. }));
}

#[tokio::test]
async fn replace_metadata_replaces_instead_of_merging() {
    let services = services_with_bucket("b1").await;
    let gateway = &services.gateway;

    let request = UploadRequest::builder()
        .bucket(bucket("b1"))
        .key(key("a.txt"))
        .content(Bytes::from_static(b"data"))
        .content_type("text/plain")
        .original_filename("a.txt")
        .metadata(HashMap::from([("owner".to_string(), "alice".to_string())]))
        .build();
    gateway.upload_object(request).await.unwrap();

    let replacement = HashMap::from([("team".to_string(), "storage".to_string())]);
    gateway
        .replace_object_metadata(&bucket("b1"), &key("a.txt"), replacement.clone())
        .await
        .unwrap();

    let head = gateway
        .head_object(&bucket("b1"), &key("a.txt"))
        .await
        .unwrap();
    assert_eq!(head.user_metadata, replacement);
    assert_eq!(head.content_type.as_deref(), Some("text/plain"));
    assert_eq!(head.size, 4);
}

#[tokio::test]
async fn replace_metadata_on_missing_key_is_not_found() {
    let services = services_with_bucket("b1").await;

    let err = services
        .gateway
        .replace_object_metadata(&bucket("b1"), &key("missing.txt"), HashMap::new())
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::NotFound { .. }));
}

#[tokio::test]
async fn presigned_and_plain_urls_differ() {
    let services = services_with_bucket("b1").await;
    services
        .gateway
        .upload_object(upload_request("b1", "a.txt", b"data"))
        .await
        .unwrap();

    let presigned = services
        .gateway
        .generate_presigned_url(&bucket("b1"), &key("a.txt"), 15)
        .await
        .unwrap();
    let plain = services
        .gateway
        .object_url(&bucket("b1"), &key("a.txt"))
        .unwrap();

    assert_eq!(plain, "http://localhost:8080/storage/b1/a.txt");
    assert!(presigned.starts_with(&plain));
    assert!(presigned.contains("X-Signature="));
    assert_ne!(presigned, plain);
}

#[tokio::test]
async fn previewable_content_types() {
    let services = create_in_memory_app().await.unwrap();
    let gateway = &services.gateway;

    for content_type in ["image/png", "video/mp4", "application/pdf", "text/plain"] {
        assert!(gateway.is_previewable(Some(content_type)), "{}", content_type);
    }
    assert!(!gateway.is_previewable(Some("application/zip")));
    assert!(!gateway.is_previewable(None));
}

#[tokio::test]
async fn upload_to_missing_bucket_fails() {
    let services = create_in_memory_app().await.unwrap();

    let err = services
        .gateway
        .upload_object(upload_request("nowhere", "a.txt", b"data"))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Upload { .. }));
}

#[tokio::test]
async fn reserved_characters_in_keys_survive_listing_and_bucket_delete() {
    let services = services_with_bucket("b1").await;
    let keys = ["report[1].txt", "50%off.txt", "dir/", "dir", "#notes", "/leading.txt"];

    for name in keys {
        services
            .gateway
            .upload_object(upload_request("b1", name, b"x"))
            .await
            .unwrap();
    }

    let mut listed = services
        .gateway
        .list_object_keys(&bucket("b1"))
        .await
        .unwrap();
    listed.sort();
    let mut expected: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
    expected.sort();
    assert_eq!(listed, expected);

    let head = services
        .gateway
        .head_object(&bucket("b1"), &key("50%off.txt"))
        .await
        .unwrap();
    assert_eq!(head.key, "50%off.txt");

    services.gateway.delete_bucket(&bucket("b1")).await.unwrap();
    assert!(services.gateway.list_buckets().await.unwrap().is_empty());
}
