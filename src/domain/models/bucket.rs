use chrono::{DateTime, Utc};

/// Region assumed when none is given
pub const DEFAULT_REGION: &str = "us-east-1";

/// Region reported when a bucket's location lookup fails
pub const UNKNOWN_REGION: &str = "unknown";

/// A bucket with aggregate statistics over its objects
#[derive(Debug, Clone, PartialEq)]
pub struct BucketInfo {
    pub name: String,
    pub creation_timestamp: DateTime<Utc>,
    pub region: String,
    /// Sum of object sizes, recomputed on every listing
    pub total_size: u64,
    pub object_count: u64,
}

impl BucketInfo {
    /// A freshly created bucket; statistics are not read back
    pub fn created(name: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            creation_timestamp: Utc::now(),
            region: region.into(),
            total_size: 0,
            object_count: 0,
        }
    }

    /// Entry used when the per-bucket detail lookup fails
    pub fn unknown(name: impl Into<String>, creation_timestamp: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            creation_timestamp,
            region: UNKNOWN_REGION.to_string(),
            total_size: 0,
            object_count: 0,
        }
    }
}
