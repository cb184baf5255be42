mod error;
pub mod in_memory;
pub mod s3;

pub use in_memory::InMemoryBackend;
pub use s3::{S3Backend, S3Config};

/// Largest number of keys returned by one listing
pub const MAX_LIST_KEYS: usize = 1000;

/// Percent-encode each segment of an object key, keeping the separators
pub(crate) fn encode_key(key: &str) -> String {
    key.split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/")
}
