use axum::{
    body::Body,
    extract::{
        multipart::{Multipart, MultipartError, MultipartRejection},
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use std::collections::HashMap;

use crate::{
    adapters::inbound::http::{
        dto::{BucketQuery, ObjectLocationQuery, ObjectMetadataDto, PreviewDto, UploadQuery},
        error::ApiError,
        router::AppState,
    },
    domain::{
        errors::GatewayError,
        models::{PreviewInfo, UploadRequest, PREVIEW_URL_EXPIRATION_MINUTES},
        value_objects::{BucketName, ObjectKey},
    },
};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

struct FilePart {
    content: Bytes,
    content_type: Option<String>,
    file_name: Option<String>,
}

fn locate(query: ObjectLocationQuery) -> Result<(BucketName, ObjectKey), ApiError> {
    Ok((BucketName::new(query.bucket)?, ObjectKey::new(query.key)?))
}

/// Handle multipart file upload
pub async fn upload_file(
    State(app_state): State<AppState>,
    query: Result<Query<UploadQuery>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ObjectMetadataDto>, ApiError> {
    let Query(query) = query?;
    let mut multipart = multipart?;
    let max_upload_bytes = app_state.settings.max_upload_bytes;
    let multipart_error = |e: MultipartError| ApiError::from_multipart(e, max_upload_bytes);

    let mut bucket = query.bucket;
    let mut key = query.key;
    let mut metadata = HashMap::new();
    let mut file = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "bucket" => bucket = Some(field.text().await.map_err(multipart_error)?),
            "key" => key = Some(field.text().await.map_err(multipart_error)?),
            "metadata" => {
                let raw = field.text().await.map_err(multipart_error)?;
                if !raw.trim().is_empty() {
                    metadata = serde_json::from_str(&raw).map_err(|e| {
                        ApiError::bad_request("Invalid metadata", e.to_string())
                    })?;
                }
            }
            "file" => {
                let content_type = field.content_type().map(str::to_string);
                let file_name = field.file_name().map(str::to_string);
                let content = field.bytes().await.map_err(multipart_error)?;
                if content.len() > max_upload_bytes {
                    return Err(GatewayError::PayloadTooLarge {
                        max_bytes: max_upload_bytes as u64,
                    }
                    .into());
                }
                file = Some(FilePart {
                    content,
                    content_type,
                    file_name,
                });
            }
            _ => {}
        }
    }

    let bucket = BucketName::new(bucket.ok_or_else(|| ApiError::missing_parameter("bucket"))?)?;
    let key = ObjectKey::new(key.ok_or_else(|| ApiError::missing_parameter("key"))?)?;
    let file = file.ok_or_else(|| ApiError::missing_parameter("file"))?;

    let original_filename = file
        .file_name
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| key.to_string());
    let content_type = file
        .content_type
        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

    let request = UploadRequest::builder()
        .bucket(bucket)
        .key(key)
        .content(file.content)
        .content_type(content_type)
        .original_filename(original_filename)
        .metadata(metadata)
        .build();

    let metadata = app_state.gateway.upload_object(request).await?;
    Ok(Json(metadata.into()))
}

/// Handle object metadata retrieval
pub async fn get_metadata(
    State(app_state): State<AppState>,
    query: Result<Query<ObjectLocationQuery>, QueryRejection>,
) -> Result<Json<ObjectMetadataDto>, ApiError> {
    let Query(query) = query?;
    let (bucket, key) = locate(query)?;

    let metadata = app_state.gateway.head_object(&bucket, &key).await?;
    Ok(Json(metadata.into()))
}

/// Handle object metadata replacement
pub async fn update_metadata(
    State(app_state): State<AppState>,
    query: Result<Query<ObjectLocationQuery>, QueryRejection>,
    body: Result<Json<HashMap<String, String>>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Query(query) = query?;
    let Json(metadata) = body?;
    let (bucket, key) = locate(query)?;

    app_state
        .gateway
        .replace_object_metadata(&bucket, &key, metadata)
        .await?;
    Ok(StatusCode::OK)
}

/// Handle streamed object download
pub async fn download_file(
    State(app_state): State<AppState>,
    query: Result<Query<ObjectLocationQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    let (bucket, key) = locate(query)?;

    let content = app_state.gateway.download_object(&bucket, &key).await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(DEFAULT_CONTENT_TYPE),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        content_disposition(key.as_str())?,
    );
    if let Some(length) = content.content_length {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    }

    Ok((headers, Body::from_stream(content.stream)).into_response())
}

/// Handle object deletion
pub async fn delete_file(
    State(app_state): State<AppState>,
    query: Result<Query<ObjectLocationQuery>, QueryRejection>,
) -> Result<&'static str, ApiError> {
    let Query(query) = query?;
    let (bucket, key) = locate(query)?;

    app_state.gateway.delete_object(&bucket, &key).await?;
    Ok("File deleted successfully")
}

/// Handle object key listing
pub async fn list_files(
    State(app_state): State<AppState>,
    query: Result<Query<BucketQuery>, QueryRejection>,
) -> Result<Json<Vec<String>>, ApiError> {
    let Query(query) = query?;
    let bucket = BucketName::new(query.bucket)?;

    let keys = app_state.gateway.list_object_keys(&bucket).await?;
    Ok(Json(keys))
}

/// Handle preview: metadata plus a short-lived presigned URL
pub async fn preview_file(
    State(app_state): State<AppState>,
    query: Result<Query<ObjectLocationQuery>, QueryRejection>,
) -> Result<Json<PreviewDto>, ApiError> {
    let Query(query) = query?;
    let (bucket, key) = locate(query)?;
    let gateway = &app_state.gateway;

    let metadata = gateway.head_object(&bucket, &key).await?;
    let previewable = gateway.is_previewable(metadata.content_type.as_deref());
    let preview_url = gateway
        .generate_presigned_url(&bucket, &key, PREVIEW_URL_EXPIRATION_MINUTES)
        .await?;

    Ok(Json(
        PreviewInfo {
            metadata,
            previewable,
            preview_url,
        }
        .into(),
    ))
}

/// `attachment` disposition naming the file after its key
///
/// Keys that are not plain ASCII get an RFC 5987 `filename*` parameter
/// next to an ASCII fallback.
fn content_disposition(key: &str) -> Result<HeaderValue, ApiError> {
    let is_plain = |c: char| (c.is_ascii_graphic() || c == ' ') && c != '"' && c != '\\';

    let value = if key.chars().all(is_plain) {
        format!("attachment; filename=\"{}\"", key)
    } else {
        let fallback: String = key
            .chars()
            .map(|c| if is_plain(c) { c } else { '_' })
            .collect();
        format!(
            "attachment; filename=\"{}\"; filename*=UTF-8''{}",
            fallback,
            urlencoding::encode(key)
        )
    };

    HeaderValue::from_str(&value).map_err(|e| {
        ApiError::from(GatewayError::Internal {
            details: e.to_string(),
        })
    })
}
