use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::{StreamExt, TryStreamExt};
use object_store::{
    memory::InMemory, path::Path as ObjectPath, Attribute, AttributeValue, Attributes,
    GetOptions, ObjectMeta, ObjectStore, PutOptions, PutPayload,
};
use std::{borrow::Cow, collections::BTreeMap, collections::HashMap, sync::Arc, time::Duration};
use tokio::sync::RwLock;

use super::{encode_key, MAX_LIST_KEYS};
use crate::{
    domain::value_objects::{BucketName, ObjectKey},
    ports::storage::{
        BackendError, BackendResult, BucketSummary, ObjectBody, ObjectHead, ObjectSummary,
        PutOutcome, StorageBackend,
    },
};

#[derive(Clone)]
struct BucketEntry {
    store: Arc<InMemory>,
    region: String,
    created_at: DateTime<Utc>,
}

/// Process-local backend holding one `object_store` in-memory store per bucket
///
/// URLs point at `base_url`; presigned URLs carry an expiry and an MD5
/// signature keyed by a per-process secret.
pub struct InMemoryBackend {
    buckets: RwLock<BTreeMap<String, BucketEntry>>,
    base_url: String,
    signing_secret: String,
}

impl InMemoryBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            buckets: RwLock::new(BTreeMap::new()),
            base_url: base_url.trim_end_matches('/').to_string(),
            signing_secret: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Check a presigned URL's expiry and signature
    pub fn verify_signature(
        &self,
        bucket: &str,
        key: &str,
        expires_at: i64,
        signature: &str,
    ) -> bool {
        expires_at > Utc::now().timestamp() && self.sign(bucket, key, expires_at) == signature
    }

    fn sign(&self, bucket: &str, key: &str, expires_at: i64) -> String {
        let digest = md5::compute(format!(
            "{}:{}/{}:{}",
            self.signing_secret, bucket, key, expires_at
        ));
        format!("{:x}", digest)
    }

    async fn store(&self, bucket: &BucketName) -> BackendResult<Arc<InMemory>> {
        self.buckets
            .read()
            .await
            .get(bucket.as_str())
            .map(|entry| entry.store.clone())
            .ok_or(BackendError::NoSuchBucket)
    }

    async fn put_with_attributes(
        store: &InMemory,
        key: &ObjectKey,
        content: Bytes,
        content_type: Option<&str>,
        metadata: &HashMap<String, String>,
    ) -> BackendResult<PutOutcome> {
        let mut attributes = Attributes::new();
        if let Some(content_type) = content_type {
            attributes.insert(
                Attribute::ContentType,
                AttributeValue::from(content_type.to_string()),
            );
        }
        for (name, value) in metadata {
            attributes.insert(
                Attribute::Metadata(Cow::Owned(name.clone())),
                AttributeValue::from(value.clone()),
            );
        }

        let options = PutOptions {
            attributes,
            ..Default::default()
        };
        let result = store
            .put_opts(&object_path(key.as_str()), PutPayload::from(content), options)
            .await?;

        Ok(PutOutcome {
            etag: result.e_tag,
        })
    }
}

/// Store path of an object key
///
/// The whole key becomes one path segment, so `/`, empty segments and
/// reserved characters survive the round trip through a listing.
fn object_path(key: &str) -> ObjectPath {
    ObjectPath::from_iter([key])
}

/// Object key stored under `path`
fn key_from_path(path: &ObjectPath) -> BackendResult<String> {
    urlencoding::decode(path.as_ref())
        .map(Cow::into_owned)
        .map_err(|e| BackendError::Service {
            message: format!("Undecodable object path {}: {}", path, e),
        })
}

/// Split stored attributes into the content type and user metadata
fn split_attributes(attributes: &Attributes) -> (Option<String>, HashMap<String, String>) {
    let mut content_type = None;
    let mut metadata = HashMap::new();

    for (attribute, value) in attributes.iter() {
        let value: &str = value.as_ref();
        match attribute {
            Attribute::ContentType => content_type = Some(value.to_string()),
            Attribute::Metadata(name) => {
                metadata.insert(name.to_string(), value.to_string());
            }
            _ => {}
        }
    }

    (content_type, metadata)
}

#[async_trait]
impl StorageBackend for InMemoryBackend {
    async fn put_object(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        content: Bytes,
        content_type: Option<&str>,
        metadata: &HashMap<String, String>,
    ) -> BackendResult<PutOutcome> {
        let store = self.store(bucket).await?;
        Self::put_with_attributes(&store, key, content, content_type, metadata).await
    }

    async fn head_object(&self, bucket: &BucketName, key: &ObjectKey) -> BackendResult<ObjectHead> {
        let store = self.store(bucket).await?;
        let options = GetOptions {
            head: true,
            ..Default::default()
        };
        let result = store
            .get_opts(&object_path(key.as_str()), options)
            .await?;
        let (content_type, metadata) = split_attributes(&result.attributes);

        Ok(ObjectHead {
            size: result.meta.size,
            content_type,
            last_modified: result.meta.last_modified,
            etag: result.meta.e_tag.clone(),
            metadata,
        })
    }

    async fn get_object(&self, bucket: &BucketName, key: &ObjectKey) -> BackendResult<ObjectBody> {
        let store = self.store(bucket).await?;
        let result = store.get(&object_path(key.as_str())).await?;
        let content_length = Some(result.meta.size);

        let stream = result
            .into_stream()
            .map_err(|e| BackendError::Io {
                message: e.to_string(),
            })
            .boxed();

        Ok(ObjectBody {
            content_length,
            stream,
        })
    }

    async fn delete_object(&self, bucket: &BucketName, key: &ObjectKey) -> BackendResult<()> {
        let store = self.store(bucket).await?;
        let path = object_path(key.as_str());
        store.head(&path).await?;
        store.delete(&path).await?;
        Ok(())
    }

    async fn delete_objects(&self, bucket: &BucketName, keys: &[String]) -> BackendResult<()> {
        let store = self.store(bucket).await?;
        for key in keys {
            store.delete(&object_path(key.as_str())).await?;
        }
        Ok(())
    }

    async fn replace_metadata(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        metadata: &HashMap<String, String>,
    ) -> BackendResult<()> {
        let store = self.store(bucket).await?;
        let existing = store.get(&object_path(key.as_str())).await?;
        let (content_type, _) = split_attributes(&existing.attributes);
        let content = existing.bytes().await?;

        Self::put_with_attributes(&store, key, content, content_type.as_deref(), metadata).await?;
        Ok(())
    }

    async fn list_objects(&self, bucket: &BucketName) -> BackendResult<Vec<ObjectSummary>> {
        let store = self.store(bucket).await?;
        let objects: Vec<ObjectMeta> = store
            .list(None)
            .take(MAX_LIST_KEYS)
            .try_collect()
            .await?;

        objects
            .into_iter()
            .map(|meta| {
                Ok(ObjectSummary {
                    key: key_from_path(&meta.location)?,
                    size: meta.size,
                })
            })
            .collect()
    }

    async fn create_bucket(&self, bucket: &BucketName, region: &str) -> BackendResult<()> {
        let mut buckets = self.buckets.write().await;
        if buckets.contains_key(bucket.as_str()) {
            return Err(BackendError::BucketAlreadyExists);
        }

        buckets.insert(
            bucket.to_string(),
            BucketEntry {
                store: Arc::new(InMemory::new()),
                region: region.to_string(),
                created_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &BucketName) -> BackendResult<()> {
        let mut buckets = self.buckets.write().await;
        let entry = buckets
            .get(bucket.as_str())
            .ok_or(BackendError::NoSuchBucket)?;

        if entry.store.list(None).next().await.is_some() {
            return Err(BackendError::Service {
                message: "The bucket you tried to delete is not empty".to_string(),
            });
        }

        buckets.remove(bucket.as_str());
        Ok(())
    }

    async fn list_buckets(&self) -> BackendResult<Vec<BucketSummary>> {
        Ok(self
            .buckets
            .read()
            .await
            .iter()
            .map(|(name, entry)| BucketSummary {
                name: name.clone(),
                created_at: Some(entry.created_at),
            })
            .collect())
    }

    async fn bucket_region(&self, bucket: &BucketName) -> BackendResult<String> {
        self.buckets
            .read()
            .await
            .get(bucket.as_str())
            .map(|entry| entry.region.clone())
            .ok_or(BackendError::NoSuchBucket)
    }

    async fn presign_get(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        expires_in: Duration,
    ) -> BackendResult<String> {
        let seconds = i64::try_from(expires_in.as_secs()).map_err(|_| BackendError::Service {
            message: "Presigned URL expiry is out of range".to_string(),
        })?;
        let expires_at = Utc::now().timestamp().saturating_add(seconds);
        let signature = self.sign(bucket.as_str(), key.as_str(), expires_at);

        Ok(format!(
            "{}?X-Expires={}&X-Signature={}",
            self.object_url(bucket, key)?,
            expires_at,
            signature
        ))
    }

    fn object_url(&self, bucket: &BucketName, key: &ObjectKey) -> BackendResult<String> {
        Ok(format!(
            "{}/{}/{}",
            self.base_url,
            bucket,
            encode_key(key.as_str())
        ))
    }
}
