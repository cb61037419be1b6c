use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A file persisted by a successful ingest.
///
/// `original_name` is the filename claimed by the client. It is kept verbatim for
/// display and debugging and is never used to build a path on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    pub stored_name: String,
    pub original_name: String,
    pub size_bytes: u64,
    /// Content type sniffed from the written bytes. Only set on the image path.
    pub detected_content_type: Option<String>,
    pub modified_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ImageResponse {
    pub stored_name: String,
    pub original_name: String,
    pub size_bytes: u64,
    pub content_type: String,
    pub modified_at: DateTime<Utc>,
}

impl From<StoredFile> for ImageResponse {
    fn from(file: StoredFile) -> Self {
        ImageResponse {
            stored_name: file.stored_name,
            original_name: file.original_name,
            size_bytes: file.size_bytes,
            content_type: file
                .detected_content_type
                .unwrap_or_else(|| "application/octet-stream".to_string()),
            modified_at: file.modified_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FileResponse {
    pub stored_name: String,
}
