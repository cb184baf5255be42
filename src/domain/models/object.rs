use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use std::collections::HashMap;

use crate::domain::{
    errors::GatewayResult,
    value_objects::{BucketName, ObjectKey},
};

/// User-metadata entry holding the content type given at upload time
pub const CONTENT_TYPE_METADATA_KEY: &str = "Content-Type";

/// User-metadata entry holding the uploaded file's original name
pub const ORIGINAL_FILENAME_METADATA_KEY: &str = "Original-Filename";

/// Metadata describing a stored object, as returned by upload and head
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectMetadata {
    pub key: String,
    pub bucket_name: String,
    pub size: u64,
    pub content_type: Option<String>,
    pub last_modified: DateTime<Utc>,
    pub etag: String,
    pub user_metadata: HashMap<String, String>,
    /// Canonical resource locator; not signed and possibly not fetchable
    pub access_url: Option<String>,
}

/// Request to store a new object
#[derive(Debug, Clone, bon::Builder)]
pub struct UploadRequest {
    pub bucket: BucketName,
    pub key: ObjectKey,
    pub content: Bytes,
    #[builder(into)]
    pub content_type: Option<String>,
    #[builder(into)]
    pub original_filename: Option<String>,
    /// Caller entries; merged over the reserved entries
    #[builder(default)]
    pub metadata: HashMap<String, String>,
}

impl UploadRequest {
    /// User metadata to store with the object
    ///
    /// Starts from the reserved content-type and original-filename entries,
    /// then applies the caller's entries on top. Callers may overwrite the
    /// reserved entries.
    pub fn merged_metadata(&self) -> HashMap<String, String> {
        let mut merged = HashMap::with_capacity(self.metadata.len() + 2);
        if let Some(content_type) = &self.content_type {
            merged.insert(CONTENT_TYPE_METADATA_KEY.to_string(), content_type.clone());
        }
        if let Some(filename) = &self.original_filename {
            merged.insert(ORIGINAL_FILENAME_METADATA_KEY.to_string(), filename.clone());
        }
        merged.extend(self.metadata.clone());
        merged
    }

    pub fn content_length(&self) -> u64 {
        self.content.len() as u64
    }
}

/// Streamed object content returned by a download
pub struct ObjectContent {
    pub content_length: Option<u64>,
    pub stream: BoxStream<'static, GatewayResult<Bytes>>,
}

impl std::fmt::Debug for ObjectContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectContent")
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}
