use async_trait::async_trait;
use aws_sdk_s3::{
    config::{BehaviorVersion, Credentials, Region},
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
    presigning::PresigningConfig,
    primitives::{ByteStream, DateTime as AwsDateTime},
    types::{
        BucketLocationConstraint, CreateBucketConfiguration, Delete, MetadataDirective,
        ObjectIdentifier,
    },
    Client,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::{StreamExt, TryStreamExt};
use std::{collections::HashMap, time::Duration};
use tokio_util::io::ReaderStream;

use super::S3Config;
use crate::{
    adapters::outbound::storage::{encode_key, MAX_LIST_KEYS},
    domain::{
        models::DEFAULT_REGION,
        value_objects::{BucketName, ObjectKey},
    },
    ports::storage::{
        BackendError, BackendResult, BucketSummary, ObjectBody, ObjectHead, ObjectSummary,
        PutOutcome, StorageBackend,
    },
};

/// Storage backend talking to an S3-compatible service
pub struct S3Backend {
    client: Client,
    config: S3Config,
}

impl S3Backend {
    /// Build the SDK client
    ///
    /// Uses static credentials when both keys are set, otherwise the default
    /// AWS credential chain (environment, profile, instance role).
    pub async fn new(config: S3Config) -> Self {
        let mut builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .force_path_style(config.force_path_style);

        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        if let (Some(access_key), Some(secret_key)) = (&config.access_key, &config.secret_key) {
            builder = builder.credentials_provider(Credentials::new(
                access_key, secret_key, None, None, "static",
            ));
        } else {
            let sdk_config = aws_config::defaults(BehaviorVersion::latest())
                .region(Region::new(config.region.clone()))
                .load()
                .await;
            if let Some(provider) = sdk_config.credentials_provider() {
                builder = builder.credentials_provider(provider.clone());
            }
        }

        Self {
            client: Client::from_conf(builder.build()),
            config,
        }
    }
}

/// Normalize an SDK failure by its S3 error code
fn backend_error<E, R>(err: SdkError<E, R>) -> BackendError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let message = DisplayErrorContext(&err).to_string();
    match &err {
        SdkError::ServiceError(service) => match service.err().code() {
            Some("NoSuchKey") | Some("NotFound") => BackendError::NoSuchKey,
            Some("NoSuchBucket") => BackendError::NoSuchBucket,
            Some("BucketAlreadyExists") | Some("BucketAlreadyOwnedByYou") => {
                BackendError::BucketAlreadyExists
            }
            _ => BackendError::Service { message },
        },
        _ => BackendError::Transport { message },
    }
}

fn to_utc(timestamp: &AwsDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(timestamp.secs(), timestamp.subsec_nanos())
}

fn to_size(length: Option<i64>) -> u64 {
    length.and_then(|l| u64::try_from(l).ok()).unwrap_or(0)
}

/// Unsigned object URL for the configured addressing style
fn build_object_url(config: &S3Config, bucket: &str, key: &str) -> BackendResult<String> {
    let key = encode_key(key);

    match config.endpoint.as_deref().map(|e| e.trim_end_matches('/')) {
        Some(endpoint) if config.force_path_style => Ok(format!("{}/{}/{}", endpoint, bucket, key)),
        Some(endpoint) => {
            let (scheme, host) = endpoint.split_once("://").ok_or_else(|| BackendError::Service {
                message: format!("Endpoint has no scheme: {}", endpoint),
            })?;
            Ok(format!("{}://{}.{}/{}", scheme, bucket, host, key))
        }
        None if config.force_path_style => Ok(format!(
            "https://s3.{}.amazonaws.com/{}/{}",
            config.region, bucket, key
        )),
        None => Ok(format!(
            "https://{}.s3.{}.amazonaws.com/{}",
            bucket, config.region, key
        )),
    }
}

#[async_trait]
impl StorageBackend for S3Backend {
    async fn put_object(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        content: Bytes,
        content_type: Option<&str>,
        metadata: &HashMap<String, String>,
    ) -> BackendResult<PutOutcome> {
        let output = self
            .client
            .put_object()
            .bucket(bucket.as_str())
            .key(key.as_str())
            .body(ByteStream::from(content))
            .set_content_type(content_type.map(str::to_string))
            .set_metadata(Some(metadata.clone()))
            .send()
            .await
            .map_err(backend_error)?;

        Ok(PutOutcome {
            etag: output.e_tag().map(str::to_string),
        })
    }

    async fn head_object(&self, bucket: &BucketName, key: &ObjectKey) -> BackendResult<ObjectHead> {
        let output = self
            .client
            .head_object()
            .bucket(bucket.as_str())
            .key(key.as_str())
            .send()
            .await
            .map_err(backend_error)?;

        Ok(ObjectHead {
            size: to_size(output.content_length()),
            content_type: output.content_type().map(str::to_string),
            last_modified: output
                .last_modified()
                .and_then(to_utc)
                .unwrap_or_else(Utc::now),
            etag: output.e_tag().map(str::to_string),
            metadata: output.metadata().cloned().unwrap_or_default(),
        })
    }

    async fn get_object(&self, bucket: &BucketName, key: &ObjectKey) -> BackendResult<ObjectBody> {
        let output = self
            .client
            .get_object()
            .bucket(bucket.as_str())
            .key(key.as_str())
            .send()
            .await
            .map_err(backend_error)?;

        let content_length = output.content_length().and_then(|l| u64::try_from(l).ok());
        let stream = ReaderStream::new(output.body.into_async_read())
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
        self.client
            .delete_object()
            .bucket(bucket.as_str())
            .key(key.as_str())
            .send()
            .await
            .map_err(backend_error)?;
        Ok(())
    }

    async fn delete_objects(&self, bucket: &BucketName, keys: &[String]) -> BackendResult<()> {
        for chunk in keys.chunks(MAX_LIST_KEYS) {
            let identifiers = chunk
                .iter()
                .map(|key| ObjectIdentifier::builder().key(key).build())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| BackendError::Service {
                    message: e.to_string(),
                })?;
            let delete = Delete::builder()
                .set_objects(Some(identifiers))
                .quiet(true)
                .build()
                .map_err(|e| BackendError::Service {
                    message: e.to_string(),
                })?;

            let output = self
                .client
                .delete_objects()
                .bucket(bucket.as_str())
                .delete(delete)
                .send()
                .await
                .map_err(backend_error)?;

            if let Some(failure) = output.errors().first() {
                return Err(BackendError::Service {
                    message: format!(
                        "Failed to delete {}: {}",
                        failure.key().unwrap_or_default(),
                        failure.message().unwrap_or_default()
                    ),
                });
            }
        }
        Ok(())
    }

    async fn replace_metadata(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        metadata: &HashMap<String, String>,
    ) -> BackendResult<()> {
        let head = self.head_object(bucket, key).await?;
        let copy_source = format!("{}/{}", bucket, encode_key(key.as_str()));

        self.client
            .copy_object()
            .bucket(bucket.as_str())
            .key(key.as_str())
            .copy_source(copy_source)
            .metadata_directive(MetadataDirective::Replace)
            .set_content_type(head.content_type)
            .set_metadata(Some(metadata.clone()))
            .send()
            .await
            .map_err(backend_error)?;
        Ok(())
    }

    async fn list_objects(&self, bucket: &BucketName) -> BackendResult<Vec<ObjectSummary>> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(bucket.as_str())
            .max_keys(MAX_LIST_KEYS as i32)
            .send()
            .await
            .map_err(backend_error)?;

        Ok(output
            .contents()
            .iter()
            .map(|object| ObjectSummary {
                key: object.key().unwrap_or_default().to_string(),
                size: to_size(object.size()),
            })
            .collect())
    }

    async fn create_bucket(&self, bucket: &BucketName, region: &str) -> BackendResult<()> {
        let mut request = self.client.create_bucket().bucket(bucket.as_str());

        // us-east-1 rejects an explicit location constraint
        if region != DEFAULT_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region))
                    .build(),
            );
        }

        request.send().await.map_err(backend_error)?;
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &BucketName) -> BackendResult<()> {
        self.client
            .delete_bucket()
            .bucket(bucket.as_str())
            .send()
            .await
            .map_err(backend_error)?;
        Ok(())
    }

    async fn list_buckets(&self) -> BackendResult<Vec<BucketSummary>> {
        let output = self
            .client
            .list_buckets()
            .send()
            .await
            .map_err(backend_error)?;

        Ok(output
            .buckets()
            .iter()
            .map(|bucket| BucketSummary {
                name: bucket.name().unwrap_or_default().to_string(),
                created_at: bucket.creation_date().and_then(to_utc),
            })
            .collect())
    }

    async fn bucket_region(&self, bucket: &BucketName) -> BackendResult<String> {
        let output = self
            .client
            .get_bucket_location()
            .bucket(bucket.as_str())
            .send()
            .await
            .map_err(backend_error)?;

        // An empty constraint means us-east-1
        Ok(output
            .location_constraint()
            .map(|c| c.as_str())
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_REGION)
            .to_string())
    }

    async fn presign_get(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        expires_in: Duration,
    ) -> BackendResult<String> {
        let presigning = PresigningConfig::expires_in(expires_in).map_err(|e| {
            BackendError::Service {
                message: e.to_string(),
            }
        })?;

        let request = self
            .client
            .get_object()
            .bucket(bucket.as_str())
            .key(key.as_str())
            .presigned(presigning)
            .await
            .map_err(backend_error)?;

        Ok(request.uri().to_string())
    }

    fn object_url(&self, bucket: &BucketName, key: &ObjectKey) -> BackendResult<String> {
        build_object_url(&self.config, bucket.as_str(), key.as_str())
    }
}
