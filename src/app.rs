use std::sync::Arc;

use crate::{
    adapters::{
        inbound::http::{
            router::DEFAULT_MAX_UPLOAD_BYTES, AppState, ErrorStatusPolicy, HttpSettings,
        },
        outbound::storage::{InMemoryBackend, S3Backend, S3Config},
    },
    ports::{services::StorageGateway, storage::StorageBackend},
    services::StorageGatewayImpl,
};

/// URL base used by the in-memory backend when none is configured
pub const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:8080/storage";

/// Configuration for the application
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub storage_backend: StorageBackendConfig,
    pub max_upload_bytes: usize,
    pub error_status_policy: ErrorStatusPolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_backend: StorageBackendConfig::default(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            error_status_policy: ErrorStatusPolicy::default(),
        }
    }
}

/// Storage backend configuration
#[derive(Debug, Clone)]
pub enum StorageBackendConfig {
    InMemory { public_base_url: String },
    S3(S3Config),
}

impl Default for StorageBackendConfig {
    fn default() -> Self {
        StorageBackendConfig::InMemory {
            public_base_url: DEFAULT_PUBLIC_BASE_URL.to_string(),
        }
    }
}

/// Application services container
#[derive(Clone)]
pub struct AppServices {
    pub gateway: Arc<dyn StorageGateway>,
    pub settings: HttpSettings,
}

impl AppServices {
    /// Router state for these services
    pub fn into_state(self) -> AppState {
        AppState::new(self.gateway).with_settings(self.settings)
    }
}

/// Application builder for dependency injection
pub struct AppBuilder {
    config: AppConfig,
}

impl AppBuilder {
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
        }
    }

    /// Configure the application with custom settings
    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_storage_backend(mut self, backend: StorageBackendConfig) -> Self {
        self.config.storage_backend = backend;
        self
    }

    pub fn with_error_status_policy(mut self, policy: ErrorStatusPolicy) -> Self {
        self.config.error_status_policy = policy;
        self
    }

    /// Build the complete application with services
    pub async fn build(self) -> Result<AppServices, AppError> {
        if self.config.max_upload_bytes == 0 {
            return Err(AppError::Configuration {
                message: "max upload size must be greater than zero".to_string(),
            });
        }

        let backend = self.create_storage_backend().await?;
        let gateway = Arc::new(StorageGatewayImpl::new(backend));

        Ok(AppServices {
            gateway,
            settings: HttpSettings {
                max_upload_bytes: self.config.max_upload_bytes,
                error_status_policy: self.config.error_status_policy,
            },
        })
    }

    /// Create the storage backend based on configuration
    async fn create_storage_backend(&self) -> Result<Arc<dyn StorageBackend>, AppError> {
        match &self.config.storage_backend {
            StorageBackendConfig::InMemory { public_base_url } => {
                if public_base_url.is_empty() {
                    return Err(AppError::Configuration {
                        message: "public base URL is required for the in-memory backend"
                            .to_string(),
                    });
                }
                Ok(Arc::new(InMemoryBackend::new(public_base_url.as_str())))
            }
            StorageBackendConfig::S3(config) => {
                if config.access_key.is_some() != config.secret_key.is_some() {
                    return Err(AppError::Configuration {
                        message: "S3 access key and secret key must be given together"
                            .to_string(),
                    });
                }
                if config.region.is_empty() {
                    return Err(AppError::StorageInit {
                        message: "S3 region must not be empty".to_string(),
                    });
                }
                Ok(Arc::new(S3Backend::new(config.clone()).await))
            }
        }
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Application-level errors
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Storage initialization error: {message}")]
    StorageInit { message: String },
}

/// Create an in-memory application for testing and development
pub async fn create_in_memory_app() -> Result<AppServices, AppError> {
    AppBuilder::new()
        .with_storage_backend(StorageBackendConfig::default())
        .build()
        .await
}

/// Create an S3-backed application
pub async fn create_s3_app(config: S3Config) -> Result<AppServices, AppError> {
    AppBuilder::new()
        .with_storage_backend(StorageBackendConfig::S3(config))
        .build()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_app_builds() {
        let services = create_in_memory_app().await.unwrap();
        assert_eq!(services.settings.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert_eq!(
            services.settings.error_status_policy,
            ErrorStatusPolicy::Strict
        );
        assert!(services.gateway.list_buckets().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_s3_keys_must_come_in_pairs() {
        let config = S3Config {
            access_key: Some("minioadmin".to_string()),
            ..S3Config::default()
        };

        let err = create_s3_app(config).await.err().unwrap();
        assert!(matches!(err, AppError::Configuration { .. }));
    }

    #[tokio::test]
    async fn test_zero_upload_limit_is_rejected() {
        let err = AppBuilder::new()
            .with_config(AppConfig {
                max_upload_bytes: 0,
                ..AppConfig::default()
            })
            .build()
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AppError::Configuration { .. }));
    }
}
