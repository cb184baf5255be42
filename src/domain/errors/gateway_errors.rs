use thiserror::Error;

/// Wire-level error codes reported in the error envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    UploadError,
    FileNotFound,
    MetadataError,
    MetadataUpdateError,
    FileReadError,
    DownloadError,
    DeleteError,
    BucketNotFound,
    ListError,
    BucketAlreadyExists,
    BucketCreateError,
    BucketDeleteError,
    BucketListError,
    PresignedUrlError,
    InternalServerError,
    FileSizeLimitExceeded,
    BadRequest,
    RouteNotFound,
    MethodNotAllowed,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::UploadError => "S3_UPLOAD_ERROR",
            ErrorCode::FileNotFound => "FILE_NOT_FOUND",
            ErrorCode::MetadataError => "S3_METADATA_ERROR",
            ErrorCode::MetadataUpdateError => "S3_METADATA_UPDATE_ERROR",
            ErrorCode::FileReadError => "FILE_READ_ERROR",
            ErrorCode::DownloadError => "S3_DOWNLOAD_ERROR",
            ErrorCode::DeleteError => "S3_DELETE_ERROR",
            ErrorCode::BucketNotFound => "BUCKET_NOT_FOUND",
            ErrorCode::ListError => "S3_LIST_ERROR",
            ErrorCode::BucketAlreadyExists => "BUCKET_ALREADY_EXISTS",
            ErrorCode::BucketCreateError => "BUCKET_CREATE_ERROR",
            ErrorCode::BucketDeleteError => "BUCKET_DELETE_ERROR",
            ErrorCode::BucketListError => "BUCKET_LIST_ERROR",
            ErrorCode::PresignedUrlError => "PRESIGNED_URL_ERROR",
            ErrorCode::InternalServerError => "INTERNAL_SERVER_ERROR",
            ErrorCode::FileSizeLimitExceeded => "FILE_SIZE_LIMIT_EXCEEDED",
            ErrorCode::BadRequest => "BAD_REQUEST",
            ErrorCode::RouteNotFound => "ROUTE_NOT_FOUND",
            ErrorCode::MethodNotAllowed => "METHOD_NOT_ALLOWED",
        }
    }

    /// Codes that describe a missing resource rather than a failure
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ErrorCode::FileNotFound | ErrorCode::BucketNotFound | ErrorCode::RouteNotFound
        )
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failures of the storage gateway
///
/// Each backend call maps its failures into one of these kinds. The
/// `Display` text is the short message shown to API callers; `details`
/// carries the backend's own explanation where there is one.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("Failed to upload file to S3")]
    Upload { details: String },

    #[error("File not found in S3")]
    NotFound { bucket: String, key: String },

    #[error("Failed to get file metadata from S3")]
    Metadata { details: String },

    #[error("Failed to update file metadata in S3")]
    MetadataUpdate { details: String },

    #[error("Failed to read file from S3")]
    Read { details: String },

    #[error("Failed to download file from S3")]
    Download { details: String },

    #[error("Failed to delete file from S3")]
    Delete { details: String },

    #[error("Bucket not found")]
    BucketNotFound { bucket: String },

    #[error("Failed to list files from S3")]
    List { details: String },

    #[error("Bucket already exists")]
    BucketAlreadyExists { bucket: String },

    #[error("Failed to create bucket")]
    BucketCreate { details: String },

    #[error("Failed to delete bucket")]
    BucketDelete { details: String },

    #[error("Failed to list buckets")]
    BucketList { details: String },

    #[error("Failed to generate presigned URL")]
    PresignedUrl { details: String },

    #[error("Uploaded file size exceeds the maximum allowed size")]
    PayloadTooLarge { max_bytes: u64 },

    #[error("An unexpected error occurred")]
    Internal { details: String },
}

impl GatewayError {
    pub fn code(&self) -> ErrorCode {
        match self {
            GatewayError::Upload { .. } => ErrorCode::UploadError,
            GatewayError::NotFound { .. } => ErrorCode::FileNotFound,
            GatewayError::Metadata { .. } => ErrorCode::MetadataError,
            GatewayError::MetadataUpdate { .. } => ErrorCode::MetadataUpdateError,
            GatewayError::Read { .. } => ErrorCode::FileReadError,
            GatewayError::Download { .. } => ErrorCode::DownloadError,
            GatewayError::Delete { .. } => ErrorCode::DeleteError,
            GatewayError::BucketNotFound { .. } => ErrorCode::BucketNotFound,
            GatewayError::List { .. } => ErrorCode::ListError,
            GatewayError::BucketAlreadyExists { .. } => ErrorCode::BucketAlreadyExists,
            GatewayError::BucketCreate { .. } => ErrorCode::BucketCreateError,
            GatewayError::BucketDelete { .. } => ErrorCode::BucketDeleteError,
            GatewayError::BucketList { .. } => ErrorCode::BucketListError,
            GatewayError::PresignedUrl { .. } => ErrorCode::PresignedUrlError,
            GatewayError::PayloadTooLarge { .. } => ErrorCode::FileSizeLimitExceeded,
            GatewayError::Internal { .. } => ErrorCode::InternalServerError,
        }
    }

    pub fn details(&self) -> Option<String> {
        match self {
            GatewayError::NotFound { bucket, key } => Some(format!(
                "File with key: {} not found in bucket: {}",
                key, bucket
            )),
            GatewayError::BucketNotFound { bucket } => {
                Some(format!("Bucket: {} not found", bucket))
            }
            GatewayError::BucketAlreadyExists { bucket } => {
                Some(format!("Bucket: {} already exists", bucket))
            }
            GatewayError::PayloadTooLarge { max_bytes } => {
                Some(format!("Maximum file size: {} bytes", max_bytes))
            }
            GatewayError::Upload { details }
            | GatewayError::Metadata { details }
            | GatewayError::MetadataUpdate { details }
            | GatewayError::Read { details }
            | GatewayError::Download { details }
            | GatewayError::Delete { details }
            | GatewayError::List { details }
            | GatewayError::BucketCreate { details }
            | GatewayError::BucketDelete { details }
            | GatewayError::BucketList { details }
            | GatewayError::PresignedUrl { details }
            | GatewayError::Internal { details } => {
                if details.is_empty() {
                    None
                } else {
                    Some(details.clone())
                }
            }
        }
    }
}

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;
