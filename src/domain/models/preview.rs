use crate::domain::models::ObjectMetadata;

/// Lifetime of the presigned URL handed out by the preview endpoint
pub const PREVIEW_URL_EXPIRATION_MINUTES: u32 = 60;

const PREVIEWABLE_PREFIXES: [&str; 3] = ["image/", "video/", "audio/"];
const PREVIEWABLE_TYPES: [&str; 3] = ["application/pdf", "text/plain", "text/html"];

/// Whether a browser can render content of this type inline
pub fn is_previewable(content_type: Option<&str>) -> bool {
    match content_type {
        Some(content_type) => {
            PREVIEWABLE_PREFIXES
                .iter()
                .any(|prefix| content_type.starts_with(prefix))
                || PREVIEWABLE_TYPES.contains(&content_type)
        }
        None => false,
    }
}

/// Object metadata plus a short-lived URL for rendering it
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewInfo {
    pub metadata: ObjectMetadata,
    pub previewable: bool,
    pub preview_url: String,
}
