use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};

use crate::{
    adapters::inbound::http::{
        dto::{BucketInfoDto, CreateBucketQuery},
        error::ApiError,
        router::AppState,
    },
    domain::{models::DEFAULT_REGION, value_objects::BucketName},
};

/// Handle bucket creation
pub async fn create_bucket(
    State(app_state): State<AppState>,
    query: Result<Query<CreateBucketQuery>, QueryRejection>,
) -> Result<Json<BucketInfoDto>, ApiError> {
    let Query(query) = query?;
    let bucket = BucketName::new(query.name)?;
    let region = query
        .region
        .filter(|region| !region.is_empty())
        .unwrap_or_else(|| DEFAULT_REGION.to_string());

    let info = app_state.gateway.create_bucket(&bucket, &region).await?;
    Ok(Json(info.into()))
}

/// Handle bucket deletion, including its objects
pub async fn delete_bucket(
    State(app_state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(bucket_name) = path?;
    let bucket = BucketName::new(bucket_name)?;

    app_state.gateway.delete_bucket(&bucket).await?;
    Ok(StatusCode::OK)
}

/// Handle bucket listing with per-bucket statistics
pub async fn list_buckets(
    State(app_state): State<AppState>,
) -> Result<Json<Vec<BucketInfoDto>>, ApiError> {
    let buckets = app_state.gateway.list_buckets().await?;
    Ok(Json(buckets.into_iter().map(BucketInfoDto::from).collect()))
}
