use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::models::{BucketInfo, ObjectMetadata, PreviewInfo};

/// DTO for object metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMetadataDto {
    pub key: String,
    pub bucket_name: String,
    pub size: u64,
    pub content_type: Option<String>,
    pub last_modified: DateTime<Utc>,
    pub etag: String,
    pub user_metadata: HashMap<String, String>,
    pub access_url: Option<String>,
}

/// DTO for bucket information
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketInfoDto {
    pub name: String,
    pub creation_timestamp: DateTime<Utc>,
    pub region: String,
    pub total_size: u64,
    pub object_count: u64,
}

/// DTO for the preview endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewDto {
    pub metadata: ObjectMetadataDto,
    pub previewable: bool,
    pub preview_url: String,
}

/// Body of every failed response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    pub timestamp: DateTime<Utc>,
    pub error_code: String,
    pub message: String,
    pub details: Option<String>,
    pub request_path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthDto {
    pub status: &'static str,
}

/// Query parameters addressing a single object
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectLocationQuery {
    pub bucket: String,
    pub key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BucketQuery {
    pub bucket: String,
}

/// Upload target; may also be sent as multipart fields
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadQuery {
    pub bucket: Option<String>,
    pub key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBucketQuery {
    pub name: String,
    pub region: Option<String>,
}

// Conversion implementations

impl From<ObjectMetadata> for ObjectMetadataDto {
    fn from(metadata: ObjectMetadata) -> Self {
        ObjectMetadataDto {
            key: metadata.key,
            bucket_name: metadata.bucket_name,
            size: metadata.size,
            content_type: metadata.content_type,
            last_modified: metadata.last_modified,
            etag: metadata.etag,
            user_metadata: metadata.user_metadata,
            access_url: metadata.access_url,
        }
    }
}

impl From<BucketInfo> for BucketInfoDto {
    fn from(info: BucketInfo) -> Self {
        BucketInfoDto {
            name: info.name,
            creation_timestamp: info.creation_timestamp,
            region: info.region,
            total_size: info.total_size,
            object_count: info.object_count,
        }
    }
}

impl From<PreviewInfo> for PreviewDto {
    fn from(preview: PreviewInfo) -> Self {
        PreviewDto {
            metadata: preview.metadata.into(),
            previewable: preview.previewable,
            preview_url: preview.preview_url,
        }
    }
}
