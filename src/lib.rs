pub mod adapters;
pub mod app;
pub mod domain;
pub mod ports;
pub mod services;

// Re-export key types for convenience

// Domain types - models, value objects and errors
pub use domain::{
    BucketInfo, BucketName, ErrorCode, GatewayError, GatewayResult, ObjectContent,
    ObjectKey, ObjectMetadata, PreviewInfo, UploadRequest, ValidationError,
};

// Port types - interfaces for external systems
pub use ports::{BackendError, StorageBackend, StorageGateway};

// Service implementations - business logic
pub use services::StorageGatewayImpl;

// Application factory and configuration
pub use app::{
    create_in_memory_app, create_s3_app, AppBuilder, AppConfig, AppError, AppServices,
    StorageBackendConfig,
};

// Adapter types - infrastructure implementations
pub use adapters::{
    inbound::http::{create_app, create_router, AppState, ErrorStatusPolicy, HttpSettings},
    outbound::storage::{InMemoryBackend, S3Backend, S3Config},
};

// Public facade for easy construction
pub mod prelude {
    pub use crate::{
        create_app, create_in_memory_app, create_router, create_s3_app, AppBuilder, AppServices,
        AppState, BucketName, GatewayError, InMemoryBackend, ObjectKey, S3Backend, S3Config,
        StorageBackend, StorageGateway, StorageGatewayImpl, UploadRequest,
    };
}
