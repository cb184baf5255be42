//! S3-compatible storage backend built on the AWS SDK
//!
//! Works against AWS itself or any S3-compatible endpoint (MinIO, R2)
//! when `endpoint` is set.

mod s3_backend;

pub use s3_backend::S3Backend;

use crate::domain::models::DEFAULT_REGION;

/// Configuration for the S3 storage backend
#[derive(Debug, Clone)]
pub struct S3Config {
    pub region: String,
    pub endpoint: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    /// Address buckets as `{endpoint}/{bucket}` instead of `{bucket}.{host}`
    pub force_path_style: bool,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            endpoint: None,
            access_key: None,
            secret_key: None,
            force_path_style: false,
        }
    }
}
