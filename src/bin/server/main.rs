use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use s3_rest_api::{
    adapters::inbound::http::{create_app, router::DEFAULT_MAX_UPLOAD_BYTES, ErrorStatusPolicy},
    app::{AppBuilder, AppConfig, StorageBackendConfig, DEFAULT_PUBLIC_BASE_URL},
    S3Config,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BackendKind {
    Memory,
    S3,
}

#[derive(Parser, Debug)]
#[command(name = "s3-rest-api")]
#[command(about = "REST API over S3-compatible object storage", long_about = None)]
struct Cli {
    /// Server port to listen on
    #[arg(short, long, env = "SERVER_PORT", default_value = "8080")]
    port: u16,

    /// Server host to bind to
    #[arg(long, env = "SERVER_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Path prefix for all endpoints; empty mounts them at the root
    #[arg(long, env = "API_PREFIX", default_value = "/api/s3")]
    api_prefix: String,

    /// Storage backend type
    #[arg(long, env = "STORAGE_BACKEND", value_enum, default_value = "memory")]
    storage_backend: BackendKind,

    /// S3 endpoint URL (for MinIO and other S3-compatible services)
    #[arg(long, env = "S3_ENDPOINT")]
    s3_endpoint: Option<String>,

    /// S3 region
    #[arg(long, env = "S3_REGION", default_value = "us-east-1")]
    s3_region: String,

    /// S3 access key
    #[arg(long, env = "S3_ACCESS_KEY")]
    s3_access_key: Option<String>,

    /// S3 secret key
    #[arg(long, env = "S3_SECRET_KEY")]
    s3_secret_key: Option<String>,

    /// Use path-style bucket addressing
    #[arg(long, env = "S3_FORCE_PATH_STYLE", default_value = "false")]
    s3_force_path_style: bool,

    /// Base of the URLs handed out by the in-memory backend
    #[arg(long, env = "PUBLIC_BASE_URL", default_value = DEFAULT_PUBLIC_BASE_URL)]
    public_base_url: String,

    /// Largest accepted request body in bytes
    #[arg(long, env = "MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    max_upload_bytes: usize,

    /// Status code mapping for errors: strict or uniform
    #[arg(long, env = "ERROR_STATUS_POLICY", default_value = "strict")]
    error_status_policy: ErrorStatusPolicy,

    /// Log filter; falls back to RUST_LOG, then to "info"
    #[arg(long, env = "LOG_LEVEL")]
    log_level: Option<String>,
}

impl Cli {
    fn to_app_config(&self) -> AppConfig {
        let storage_backend = match self.storage_backend {
            BackendKind::Memory => StorageBackendConfig::InMemory {
                public_base_url: self.public_base_url.clone(),
            },
            BackendKind::S3 => StorageBackendConfig::S3(S3Config {
                region: self.s3_region.clone(),
                endpoint: self.s3_endpoint.clone(),
                access_key: self.s3_access_key.clone(),
                secret_key: self.s3_secret_key.clone(),
                force_path_style: self.s3_force_path_style,
            }),
        };

        AppConfig {
            storage_backend,
            max_upload_bytes: self.max_upload_bytes,
            error_status_policy: self.error_status_policy,
        }
    }

    fn env_filter(&self) -> Result<EnvFilter> {
        match &self.log_level {
            Some(level) => EnvFilter::try_new(level).context("Invalid log level"),
            None => Ok(EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL))),
        }
    }

    fn init_logging(&self) -> Result<()> {
        let env_filter = self.env_filter()?;

        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .context("Failed to initialize logging")?;

        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    cli.init_logging()?;

    info!("Starting S3 REST API");
    info!("Storage backend: {:?}", cli.storage_backend);
    info!("Error status policy: {}", cli.error_status_policy);

    let services = AppBuilder::new()
        .with_config(cli.to_app_config())
        .build()
        .await
        .context("Failed to build application")?;

    let router = create_app(services.into_state(), &cli.api_prefix);

    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port)
        .parse()
        .context("Invalid listen address")?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Server listening on http://{}{}", addr, cli.api_prefix);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Failed to start server")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["s3-rest-api"]);

        assert_eq!(cli.port, 8080);
        assert_eq!(cli.api_prefix, "/api/s3");
        assert_eq!(cli.storage_backend, BackendKind::Memory);
        assert_eq!(cli.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(cli.error_status_policy, ErrorStatusPolicy::Strict);
    }

    #[test]
    fn test_explicit_log_level() {
        let cli = Cli::parse_from(["s3-rest-api", "--log-level", "s3_rest_api=debug"]);
        assert_eq!(cli.log_level.as_deref(), Some("s3_rest_api=debug"));
        assert!(cli.env_filter().is_ok());

        let cli = Cli::parse_from(["s3-rest-api", "--log-level", "s3_rest_api=loud"]);
        assert!(cli.env_filter().is_err());
    }

    #[test]
    fn test_cli_s3_config() {
        let cli = Cli::parse_from([
            "s3-rest-api",
            "--storage-backend",
            "s3",
            "--s3-endpoint",
            "http://localhost:9000",
            "--s3-region",
            "eu-west-1",
            "--s3-access-key",
            "minioadmin",
            "--s3-secret-key",
            "minioadmin",
            "--s3-force-path-style",
            "--error-status-policy",
            "uniform",
        ]);

        let config = cli.to_app_config();
        assert_eq!(config.error_status_policy, ErrorStatusPolicy::Uniform);
        match config.storage_backend {
            StorageBackendConfig::S3(s3) => {
                assert_eq!(s3.endpoint.as_deref(), Some("http://localhost:9000"));
                assert_eq!(s3.region, "eu-west-1");
                assert!(s3.force_path_style);
            }
            other => panic!("unexpected backend: {:?}", other),
        }
    }
}
