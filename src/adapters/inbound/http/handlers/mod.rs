pub mod bucket_handlers;
pub mod object_handlers;

pub use bucket_handlers::*;
pub use object_handlers::*;

use axum::Json;

use super::dto::HealthDto;

/// Liveness check; does not touch the backend
pub async fn health() -> Json<HealthDto> {
    Json(HealthDto { status: "ok" })
}
