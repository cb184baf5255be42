pub mod services;
pub mod storage;

pub use services::StorageGateway;
pub use storage::{
    BackendError, BackendResult, BucketSummary, ObjectBody, ObjectHead, ObjectSummary,
    PutOutcome, StorageBackend,
};
