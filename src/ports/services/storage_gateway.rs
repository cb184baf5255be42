use async_trait::async_trait;
use std::collections::HashMap;

use crate::domain::{
    errors::GatewayResult,
    models::{BucketInfo, ObjectContent, ObjectMetadata, UploadRequest},
    value_objects::{BucketName, ObjectKey},
};

/// Port for the storage gateway
///
/// Turns API-level requests into backend calls and reports failures with
/// the closed [`GatewayError`](crate::domain::errors::GatewayError) set.
/// Holds no state between calls.
#[async_trait]
pub trait StorageGateway: Send + Sync + 'static {
    /// Store an object and return its metadata with a fresh access URL
    async fn upload_object(&self, request: UploadRequest) -> GatewayResult<ObjectMetadata>;

    async fn head_object(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
    ) -> GatewayResult<ObjectMetadata>;

    /// Replace (not merge) the object's user metadata
    async fn replace_object_metadata(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        metadata: HashMap<String, String>,
    ) -> GatewayResult<()>;

    async fn download_object(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
    ) -> GatewayResult<ObjectContent>;

    /// Delete an object; an absent key is an error
    async fn delete_object(&self, bucket: &BucketName, key: &ObjectKey) -> GatewayResult<()>;

    /// Keys of a single listing page
    async fn list_object_keys(&self, bucket: &BucketName) -> GatewayResult<Vec<String>>;

    async fn create_bucket(&self, bucket: &BucketName, region: &str) -> GatewayResult<BucketInfo>;

    /// Empty the bucket (single page) and delete it
    async fn delete_bucket(&self, bucket: &BucketName) -> GatewayResult<()>;

    /// Every bucket with its region and aggregate size/count
    async fn list_buckets(&self) -> GatewayResult<Vec<BucketInfo>>;

    /// A signed GET URL valid for `expiration_minutes`
    async fn generate_presigned_url(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        expiration_minutes: u32,
    ) -> GatewayResult<String>;

    /// The plain resource URL, or `None` if it cannot be built
    fn object_url(&self, bucket: &BucketName, key: &ObjectKey) -> Option<String>;

    fn is_previewable(&self, content_type: Option<&str>) -> bool;
}
