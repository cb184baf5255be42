use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use std::{collections::HashMap, time::Duration};
use thiserror::Error;

use crate::domain::value_objects::{BucketName, ObjectKey};

/// Port for the object-storage provider
///
/// This is the full capability set the gateway needs from a backend. Any
/// provider that can do these operations (S3, MinIO, an in-process store)
/// can sit behind it.
#[async_trait]
pub trait StorageBackend: Send + Sync + 'static {
    /// Store an object, replacing any existing object under the same key
    async fn put_object(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        content: Bytes,
        content_type: Option<&str>,
        metadata: &HashMap<String, String>,
    ) -> BackendResult<PutOutcome>;

    /// Fetch object metadata without the body
    async fn head_object(&self, bucket: &BucketName, key: &ObjectKey) -> BackendResult<ObjectHead>;

    /// Open the object body as a stream
    async fn get_object(&self, bucket: &BucketName, key: &ObjectKey) -> BackendResult<ObjectBody>;

    async fn delete_object(&self, bucket: &BucketName, key: &ObjectKey) -> BackendResult<()>;

    /// Delete several objects in one request
    async fn delete_objects(&self, bucket: &BucketName, keys: &[String]) -> BackendResult<()>;

    /// Copy an object onto itself with its user metadata replaced
    ///
    /// The content type is kept. Not atomic with concurrent writers.
    async fn replace_metadata(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        metadata: &HashMap<String, String>,
    ) -> BackendResult<()>;

    /// List a single page of objects
    async fn list_objects(&self, bucket: &BucketName) -> BackendResult<Vec<ObjectSummary>>;

    async fn create_bucket(&self, bucket: &BucketName, region: &str) -> BackendResult<()>;

    /// Delete an empty bucket
    async fn delete_bucket(&self, bucket: &BucketName) -> BackendResult<()>;

    async fn list_buckets(&self) -> BackendResult<Vec<BucketSummary>>;

    /// Region the bucket lives in
    async fn bucket_region(&self, bucket: &BucketName) -> BackendResult<String>;

    /// A signed, time-limited GET URL
    async fn presign_get(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        expires_in: Duration,
    ) -> BackendResult<String>;

    /// The canonical, unsigned URL of an object
    fn object_url(&self, bucket: &BucketName, key: &ObjectKey) -> BackendResult<String>;
}

/// Normalized backend failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackendError {
    #[error("The specified key does not exist")]
    NoSuchKey,

    #[error("The specified bucket does not exist")]
    NoSuchBucket,

    #[error("The requested bucket name is not available")]
    BucketAlreadyExists,

    /// The backend answered with an error
    #[error("{message}")]
    Service { message: String },

    /// The request never got an answer (connection, timeout, signing)
    #[error("{message}")]
    Transport { message: String },

    /// Reading a response body failed part way
    #[error("{message}")]
    Io { message: String },
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Result of a successful put
#[derive(Debug, Clone, Default)]
pub struct PutOutcome {
    pub etag: Option<String>,
}

/// Object metadata as reported by the backend
#[derive(Debug, Clone)]
pub struct ObjectHead {
    pub size: u64,
    pub content_type: Option<String>,
    pub last_modified: DateTime<Utc>,
    pub etag: Option<String>,
    pub metadata: HashMap<String, String>,
}

/// An open object body
pub struct ObjectBody {
    pub content_length: Option<u64>,
    pub stream: BoxStream<'static, BackendResult<Bytes>>,
}

impl std::fmt::Debug for ObjectBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectBody")
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// One entry of an object listing
#[derive(Debug, Clone)]
pub struct ObjectSummary {
    pub key: String,
    pub size: u64,
}

/// One entry of a bucket listing
#[derive(Debug, Clone)]
pub struct BucketSummary {
    pub name: String,
    pub created_at: Option<DateTime<Utc>>,
}
