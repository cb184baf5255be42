use axum::{
    extract::{DefaultBodyLimit, Request},
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use super::{
    error::ApiError,
    handlers::{
        create_bucket, delete_bucket, delete_file, download_file, get_metadata, health,
        list_buckets, list_files, preview_file, update_metadata, upload_file,
    },
    middleware::{render_error_envelope, ErrorStatusPolicy},
};
use crate::ports::services::StorageGateway;

/// Default upper bound on an uploaded file, 10 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Room for multipart boundaries, part headers and the text fields
pub const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// HTTP-level settings shared by all handlers
#[derive(Debug, Clone, Copy)]
pub struct HttpSettings {
    pub max_upload_bytes: usize,
    pub error_status_policy: ErrorStatusPolicy,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            error_status_policy: ErrorStatusPolicy::default(),
        }
    }
}

/// Application state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<dyn StorageGateway>,
    pub settings: HttpSettings,
}

impl AppState {
    pub fn new(gateway: Arc<dyn StorageGateway>) -> Self {
        Self {
            gateway,
            settings: HttpSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: HttpSettings) -> Self {
        self.settings = settings;
        self
    }
}

fn api_routes() -> Router<AppState> {
    Router::new()
        // Object operations
        .route("/upload", post(upload_file))
        .route("/metadata", get(get_metadata).put(update_metadata))
        .route("/download", get(download_file))
        .route("/delete", delete(delete_file))
        .route("/list", get(list_files))
        .route("/preview", get(preview_file))
        // Bucket operations
        .route("/buckets", post(create_bucket).get(list_buckets))
        .route("/buckets/{bucket_name}", delete(delete_bucket))
        .route("/health", get(health))
        .method_not_allowed_fallback(method_not_allowed)
}

async fn route_not_found() -> ApiError {
    ApiError::RouteNotFound
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

fn with_layers(routes: Router<AppState>, state: AppState) -> Router {
    let settings = state.settings;

    routes
        .fallback(route_not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                        request_id = %Uuid::new_v4(),
                    )
                }))
                .layer(middleware::from_fn_with_state(
                    settings.error_status_policy,
                    render_error_envelope,
                ))
                .layer(DefaultBodyLimit::max(
                    settings
                        .max_upload_bytes
                        .saturating_add(MULTIPART_OVERHEAD_BYTES),
                )),
        )
        .with_state(state)
}

/// Create the router with all endpoints mounted at the root
pub fn create_router(state: AppState) -> Router {
    with_layers(api_routes(), state)
}

/// Create the router with all endpoints under `prefix`
///
/// An empty prefix (or `/`) mounts the endpoints at the root.
pub fn create_app(state: AppState, prefix: &str) -> Router {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        return create_router(state);
    }

    let routes = Router::new().nest(&format!("/{}", prefix), api_routes());
    with_layers(routes, state)
}
