use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::{StreamExt, TryStreamExt};
use std::{collections::HashMap, sync::Arc, time::Duration};
use tracing::{error, warn};

use crate::{
    domain::{
        errors::{GatewayError, GatewayResult},
        models::{is_previewable, BucketInfo, ObjectContent, ObjectMetadata, UploadRequest},
        value_objects::{BucketName, ObjectKey},
    },
    ports::{
        services::StorageGateway,
        storage::{BackendError, BackendResult, BucketSummary, ObjectHead, StorageBackend},
    },
};

/// Storage gateway over a single backend handle
#[derive(Clone)]
pub struct StorageGatewayImpl {
    backend: Arc<dyn StorageBackend>,
}

impl StorageGatewayImpl {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    fn metadata_from_head(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        head: ObjectHead,
    ) -> ObjectMetadata {
        ObjectMetadata {
            key: key.to_string(),
            bucket_name: bucket.to_string(),
            size: head.size,
            content_type: head.content_type,
            last_modified: head.last_modified,
            etag: head.etag.unwrap_or_default(),
            user_metadata: head.metadata,
            access_url: self.object_url(bucket, key),
        }
    }

    /// Region and aggregate statistics of one bucket, or the unknown entry
    async fn bucket_details(&self, summary: BucketSummary) -> BucketInfo {
        let created_at = summary.created_at.unwrap_or_default();

        let bucket = match BucketName::new(summary.name.as_str()) {
            Ok(bucket) => bucket,
            Err(e) => {
                warn!(bucket = %summary.name, error = %e, "Skipping details for bucket with unsupported name");
                return BucketInfo::unknown(summary.name, created_at);
            }
        };

        match self.collect_bucket_stats(&bucket, created_at).await {
            Ok(info) => info,
            Err(e) => {
                warn!(%bucket, error = %e, "Failed to get bucket details");
                BucketInfo::unknown(summary.name, created_at)
            }
        }
    }

    async fn collect_bucket_stats(
        &self,
        bucket: &BucketName,
        created_at: DateTime<Utc>,
    ) -> BackendResult<BucketInfo> {
        let region = self.backend.bucket_region(bucket).await?;
        let objects = self.backend.list_objects(bucket).await?;

        Ok(BucketInfo {
            name: bucket.to_string(),
            creation_timestamp: created_at,
            region,
            total_size: objects.iter().map(|o| o.size).sum(),
            object_count: objects.len() as u64,
        })
    }
}

#[async_trait]
impl StorageGateway for StorageGatewayImpl {
    #[tracing::instrument(skip(self, request), fields(bucket = %request.bucket, key = %request.key))]
    async fn upload_object(&self, request: UploadRequest) -> GatewayResult<ObjectMetadata> {
        let metadata = request.merged_metadata();
        let size = request.content_length();
        let UploadRequest {
            bucket,
            key,
            content,
            content_type,
            ..
        } = request;

        let outcome = self
            .backend
            .put_object(&bucket, &key, content, content_type.as_deref(), &metadata)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to upload file to S3");
                GatewayError::Upload {
                    details: e.to_string(),
                }
            })?;

        Ok(ObjectMetadata {
            access_url: self.object_url(&bucket, &key),
            key: key.to_string(),
            bucket_name: bucket.to_string(),
            size,
            content_type,
            last_modified: Utc::now(),
            etag: outcome.etag.unwrap_or_default(),
            user_metadata: metadata,
        })
    }

    #[tracing::instrument(skip(self))]
    async fn head_object(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
    ) -> GatewayResult<ObjectMetadata> {
        let head = self
            .backend
            .head_object(bucket, key)
            .await
            .map_err(|e| match e {
                BackendError::NoSuchKey => {
                    error!("File not found in S3");
                    GatewayError::NotFound {
                        bucket: bucket.to_string(),
                        key: key.to_string(),
                    }
                }
                other => {
                    error!(error = %other, "Failed to get file metadata from S3");
                    GatewayError::Metadata {
                        details: other.to_string(),
                    }
                }
            })?;

        Ok(self.metadata_from_head(bucket, key, head))
    }

    #[tracing::instrument(skip(self, metadata))]
    async fn replace_object_metadata(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        metadata: HashMap<String, String>,
    ) -> GatewayResult<()> {
        let to_gateway_error = |e: BackendError| match e {
            BackendError::NoSuchKey => {
                error!("File not found in S3");
                GatewayError::NotFound {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                }
            }
            other => {
                error!(error = %other, "Failed to update file metadata in S3");
                GatewayError::MetadataUpdate {
                    details: other.to_string(),
                }
            }
        };

        self.backend
            .head_object(bucket, key)
            .await
            .map_err(to_gateway_error)?;

        self.backend
            .replace_metadata(bucket, key, &metadata)
            .await
            .map_err(to_gateway_error)
    }

    #[tracing::instrument(skip(self))]
    async fn download_object(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
    ) -> GatewayResult<ObjectContent> {
        let body = self
            .backend
            .get_object(bucket, key)
            .await
            .map_err(|e| match e {
                BackendError::NoSuchKey => {
                    error!("File not found in S3");
                    GatewayError::NotFound {
                        bucket: bucket.to_string(),
                        key: key.to_string(),
                    }
                }
                BackendError::Io { message } => {
                    error!(error = %message, "Failed to read file from S3");
                    GatewayError::Read { details: message }
                }
                other => {
                    error!(error = %other, "Failed to download file from S3");
                    GatewayError::Download {
                        details: other.to_string(),
                    }
                }
            })?;

        let bucket_name = bucket.to_string();
        let key_name = key.to_string();
        let stream = body
            .stream
            .map_err(move |e| {
                error!(bucket = %bucket_name, key = %key_name, error = %e, "Failed to read file from S3");
                GatewayError::Read {
                    details: e.to_string(),
                }
            })
            .boxed();

        Ok(ObjectContent {
            content_length: body.content_length,
            stream,
        })
    }

    #[tracing::instrument(skip(self))]
    async fn delete_object(&self, bucket: &BucketName, key: &ObjectKey) -> GatewayResult<()> {
        let to_gateway_error = |e: BackendError| match e {
            BackendError::NoSuchKey => {
                error!("File not found in S3");
                GatewayError::NotFound {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                }
            }
            other => {
                error!(error = %other, "Failed to delete file from S3");
                GatewayError::Delete {
                    details: other.to_string(),
                }
            }
        };

        // Deleting an absent key is reported, not ignored
        self.backend
            .head_object(bucket, key)
            .await
            .map_err(to_gateway_error)?;

        self.backend
            .delete_object(bucket, key)
            .await
            .map_err(to_gateway_error)
    }

    #[tracing::instrument(skip(self))]
    async fn list_object_keys(&self, bucket: &BucketName) -> GatewayResult<Vec<String>> {
        let objects = self
            .backend
            .list_objects(bucket)
            .await
            .map_err(|e| match e {
                BackendError::NoSuchBucket => {
                    error!("Bucket not found");
                    GatewayError::BucketNotFound {
                        bucket: bucket.to_string(),
                    }
                }
                other => {
                    error!(error = %other, "Failed to list files from S3");
                    GatewayError::List {
                        details: other.to_string(),
                    }
                }
            })?;

        Ok(objects.into_iter().map(|o| o.key).collect())
    }

    #[tracing::instrument(skip(self))]
    async fn create_bucket(&self, bucket: &BucketName, region: &str) -> GatewayResult<BucketInfo> {
        self.backend
            .create_bucket(bucket, region)
            .await
            .map_err(|e| match e {
                BackendError::BucketAlreadyExists => {
                    error!("Bucket already exists");
                    GatewayError::BucketAlreadyExists {
                        bucket: bucket.to_string(),
                    }
                }
                other => {
                    error!(error = %other, "Failed to create bucket");
                    GatewayError::BucketCreate {
                        details: other.to_string(),
                    }
                }
            })?;

        Ok(BucketInfo::created(bucket.as_str(), region))
    }

    #[tracing::instrument(skip(self))]
    async fn delete_bucket(&self, bucket: &BucketName) -> GatewayResult<()> {
        let to_gateway_error = |e: BackendError| match e {
            BackendError::NoSuchBucket => {
                error!("Bucket not found");
                GatewayError::BucketNotFound {
                    bucket: bucket.to_string(),
                }
            }
            other => {
                error!(error = %other, "Failed to delete bucket");
                GatewayError::BucketDelete {
                    details: other.to_string(),
                }
            }
        };

        let objects = self
            .backend
            .list_objects(bucket)
            .await
            .map_err(to_gateway_error)?;

        // No rollback: objects stay deleted if the bucket delete fails
        if !objects.is_empty() {
            let keys: Vec<String> = objects.into_iter().map(|o| o.key).collect();
            self.backend
                .delete_objects(bucket, &keys)
                .await
                .map_err(to_gateway_error)?;
        }

        self.backend
            .delete_bucket(bucket)
            .await
            .map_err(to_gateway_error)
    }

    #[tracing::instrument(skip(self))]
    async fn list_buckets(&self) -> GatewayResult<Vec<BucketInfo>> {
        let summaries = self.backend.list_buckets().await.map_err(|e| {
            error!(error = %e, "Failed to list buckets");
            GatewayError::BucketList {
                details: e.to_string(),
            }
        })?;

        Ok(futures::future::join_all(
            summaries
                .into_iter()
                .map(|summary| self.bucket_details(summary)),
        )
        .await)
    }

    #[tracing::instrument(skip(self))]
    async fn generate_presigned_url(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        expiration_minutes: u32,
    ) -> GatewayResult<String> {
        let expires_in = Duration::from_secs(u64::from(expiration_minutes) * 60);

        self.backend
            .presign_get(bucket, key, expires_in)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to generate presigned URL");
                GatewayError::PresignedUrl {
                    details: e.to_string(),
                }
            })
    }

    fn object_url(&self, bucket: &BucketName, key: &ObjectKey) -> Option<String> {
        match self.backend.object_url(bucket, key) {
            Ok(url) => Some(url),
            Err(e) => {
                warn!(%bucket, %key, error = %e, "Failed to build object URL");
                None
            }
        }
    }

    fn is_previewable(&self, content_type: Option<&str>) -> bool {
        is_previewable(content_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        adapters::outbound::storage::InMemoryBackend,
        domain::models::{ORIGINAL_FILENAME_METADATA_KEY, UNKNOWN_REGION},
        ports::storage::{ObjectBody, ObjectSummary, PutOutcome},
    };
    use bytes::Bytes;

    /// In-memory backend with injectable failures
    struct FaultyBackend {
        inner: InMemoryBackend,
        region_failure_for: Option<String>,
        url_failure: bool,
        bucket_delete_failure: bool,
    }

    impl FaultyBackend {
        fn new() -> Self {
            Self {
                inner: InMemoryBackend::new("http://localhost:8080/storage"),
                region_failure_for: None,
                url_failure: false,
                bucket_delete_failure: false,
            }
        }
    }

    #[async_trait]
    impl StorageBackend for FaultyBackend {
        async fn put_object(
            &self,
            bucket: &BucketName,
            key: &ObjectKey,
            content: Bytes,
            content_type: Option<&str>,
            metadata: &HashMap<String, String>,
        ) -> BackendResult<PutOutcome> {
            self.inner
                .put_object(bucket, key, content, content_type, metadata)
                .await
        }

        async fn head_object(
            &self,
            bucket: &BucketName,
            key: &ObjectKey,
        ) -> BackendResult<ObjectHead> {
            self.inner.head_object(bucket, key).await
        }

        async fn get_object(
            &self,
            bucket: &BucketName,
            key: &ObjectKey,
        ) -> BackendResult<ObjectBody> {
            self.inner.get_object(bucket, key).await
        }

        async fn delete_object(&self, bucket: &BucketName, key: &ObjectKey) -> BackendResult<()> {
            self.inner.delete_object(bucket, key).await
        }

        async fn delete_objects(&self, bucket: &BucketName, keys: &[String]) -> BackendResult<()> {
            self.inner.delete_objects(bucket, keys).await
        }

        async fn replace_metadata(
            &self,
            bucket: &BucketName,
            key: &ObjectKey,
            metadata: &HashMap<String, String>,
        ) -> BackendResult<()> {
            self.inner.replace_metadata(bucket, key, metadata).await
        }

        async fn list_objects(&self, bucket: &BucketName) -> BackendResult<Vec<ObjectSummary>> {
            self.inner.list_objects(bucket).await
        }

        async fn create_bucket(&self, bucket: &BucketName, region: &str) -> BackendResult<()> {
            self.inner.create_bucket(bucket, region).await
        }

        async fn delete_bucket(&self, bucket: &BucketName) -> BackendResult<()> {
            if self.bucket_delete_failure {
                return Err(BackendError::Service {
                    message: "Access Denied".to_string(),
                });
            }
            self.inner.delete_bucket(bucket).await
        }

        async fn list_buckets(&self) -> BackendResult<Vec<BucketSummary>> {
            self.inner.list_buckets().await
        }

        async fn bucket_region(&self, bucket: &BucketName) -> BackendResult<String> {
            if self.region_failure_for.as_deref() == Some(bucket.as_str()) {
                return Err(BackendError::Service {
                    message: "Access Denied".to_string(),
                });
            }
            self.inner.bucket_region(bucket).await
        }

        async fn presign_get(
            &self,
            bucket: &BucketName,
            key: &ObjectKey,
            expires_in: Duration,
        ) -> BackendResult<String> {
            self.inner.presign_get(bucket, key, expires_in).await
        }

        fn object_url(&self, bucket: &BucketName, key: &ObjectKey) -> BackendResult<String> {
            if self.url_failure {
                return Err(BackendError::Service {
                    message: "no endpoint".to_string(),
                });
            }
            self.inner.object_url(bucket, key)
        }
    }

    fn bucket(name: &str) -> BucketName {
        BucketName::new(name).unwrap()
    }

    fn key(name: &str) -> ObjectKey {
        ObjectKey::new(name).unwrap()
    }

    async fn upload(
        gateway: &StorageGatewayImpl,
        bucket_name: &str,
        key_name: &str,
        data: &'static [u8],
    ) {
        let request = UploadRequest::builder()
            .bucket(bucket(bucket_name))
            .key(key(key_name))
            .content(Bytes::from_static(data))
            .content_type("text/plain")
            .original_filename(key_name)
            .build();
        gateway.upload_object(request).await.unwrap();
    }

    #[tokio::test]
    async fn test_list_buckets_degrades_single_entry() {
        let backend = FaultyBackend {
            region_failure_for: Some("broken".to_string()),
            ..FaultyBackend::new()
        };
        let gateway = StorageGatewayImpl::new(Arc::new(backend));

        gateway.create_bucket(&bucket("broken"), "eu-west-1").await.unwrap();
        gateway.create_bucket(&bucket("healthy"), "eu-west-1").await.unwrap();
        upload(&gateway, "broken", "a.txt", b"12345").await;
        upload(&gateway, "healthy", "a.txt", b"12345").await;
        upload(&gateway, "healthy", "b.txt", b"123").await;

        let buckets = gateway.list_buckets().await.unwrap();
        assert_eq!(buckets.len(), 2);

        let broken = buckets.iter().find(|b| b.name == "broken").unwrap();
        assert_eq!(broken.region, UNKNOWN_REGION);
        assert_eq!(broken.total_size, 0);
        assert_eq!(broken.object_count, 0);

        let healthy = buckets.iter().find(|b| b.name == "healthy").unwrap();
        assert_eq!(healthy.region, "eu-west-1");
        assert_eq!(healthy.total_size, 8);
        assert_eq!(healthy.object_count, 2);
    }

    #[tokio::test]
    async fn test_url_failure_yields_absent_access_url() {
        let backend = FaultyBackend {
            url_failure: true,
            ..FaultyBackend::new()
        };
        let gateway = StorageGatewayImpl::new(Arc::new(backend));
        gateway.create_bucket(&bucket("b1"), "us-east-1").await.unwrap();
        upload(&gateway, "b1", "a.txt", b"hello").await;

        let metadata = gateway.head_object(&bucket("b1"), &key("a.txt")).await.unwrap();
        assert_eq!(metadata.access_url, None);
        assert_eq!(metadata.user_metadata[ORIGINAL_FILENAME_METADATA_KEY], "a.txt");
    }

    #[tokio::test]
    async fn test_delete_bucket_is_not_transactional() {
        let backend = FaultyBackend {
            bucket_delete_failure: true,
            ..FaultyBackend::new()
        };
        let gateway = StorageGatewayImpl::new(Arc::new(backend));
        gateway.create_bucket(&bucket("b1"), "us-east-1").await.unwrap();
        upload(&gateway, "b1", "a.txt", b"hello").await;

        let err = gateway.delete_bucket(&bucket("b1")).await.unwrap_err();
        assert!(matches!(err, GatewayError::BucketDelete { .. }));

        // Objects are already gone, the bucket remains
        let keys = gateway.list_object_keys(&bucket("b1")).await.unwrap();
        assert!(keys.is_empty());
    }
}
