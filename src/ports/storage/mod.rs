mod storage_backend;

pub use storage_backend::{
    BackendError, BackendResult, BucketSummary, ObjectBody, ObjectHead, ObjectSummary,
    PutOutcome, StorageBackend,
};
