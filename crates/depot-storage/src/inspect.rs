//! Content-type sniffing of stored files.
//!
//! Classification looks only at the bytes on disk. The client's declared MIME type and
//! the file extension are never consulted. An image signature only counts once the
//! matching decoder has read the header that follows it.

use crate::traits::{StorageError, StorageResult};
use async_trait::async_trait;
use image::{ImageFormat, ImageReader};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

/// Number of leading bytes handed to the signature matchers.
pub const SNIFF_LEN: usize = 8192;

const UNRECOGNISED: &str = "application/octet-stream";

static SHARED: LazyLock<MagicInspector> = LazyLock::new(MagicInspector::new);

/// Process-wide inspector. The signature table is built on first use and reused by
/// every request afterwards.
pub fn shared() -> &'static MagicInspector {
    &SHARED
}

/// Content type detected from a file's bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedType {
    mime: String,
}

impl DetectedType {
    pub fn new(mime: impl Into<String>) -> Self {
        DetectedType { mime: mime.into() }
    }

    pub fn mime_type(&self) -> &str {
        &self.mime
    }

    /// Whether the content belongs to the `image/*` family.
    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }
}

/// Classifies the content of a stored file.
///
/// Implementations follow symbolic links. An `Err` means the inspector itself could
/// not do its job (unreadable file, unusable signature data); it never means "the
/// content did not match".
#[async_trait]
pub trait ContentInspector: Send + Sync {
    async fn inspect(&self, path: &Path) -> StorageResult<DetectedType>;
}

/// Magic-number inspector backed by the `infer` signature matchers.
pub struct MagicInspector {
    matcher: infer::Infer,
}

impl MagicInspector {
    pub fn new() -> Self {
        tracing::debug!("Loading content signature matchers");
        MagicInspector {
            matcher: infer::Infer::new(),
        }
    }

    /// Classify a buffer holding the start of a file.
    ///
    /// Unrecognised content is `text/plain` when it is NUL-free UTF-8,
    /// `application/x-empty` when there are no bytes at all and
    /// `application/octet-stream` otherwise.
    pub fn classify(&self, head: &[u8]) -> DetectedType {
        if head.is_empty() {
            return DetectedType::new("application/x-empty");
        }

        if let Some(kind) = self.matcher.get(head) {
            return DetectedType::new(kind.mime_type());
        }

        if !head.contains(&0) && utf8_prefix_is_valid(head) {
            DetectedType::new("text/plain")
        } else {
            DetectedType::new(UNRECOGNISED)
        }
    }
}

impl Default for MagicInspector {
    fn default() -> Self {
        Self::new()
    }
}

// The sniff window may cut a multi-byte character in half; only an error before the
// final three bytes counts as invalid.
fn utf8_prefix_is_valid(head: &[u8]) -> bool {
    match std::str::from_utf8(head) {
        Ok(_) => true,
        Err(e) => e.error_len().is_none() && head.len() - e.valid_up_to() < 4,
    }
}

// An `image/*` signature only stands if the decoder for that format reads the header
// behind it. `BM` (BMP) and `II*\0` (TIFF) are short enough to occur in plain text.
// Any failure here demotes the file to unrecognised content.
async fn confirm_image_header(path: PathBuf, claimed: DetectedType) -> DetectedType {
    let mime = claimed.mime_type().to_string();
    let check =
        tokio::task::spawn_blocking(move || read_image_dimensions(&path, &mime)).await;

    match check {
        Ok(Ok((width, height))) => {
            tracing::debug!(
                mime_type = %claimed.mime_type(),
                width,
                height,
                "Image header confirmed"
            );
            claimed
        }
        Ok(Err(reason)) => {
            tracing::debug!(
                mime_type = %claimed.mime_type(),
                reason = %reason,
                "Image signature without a readable header"
            );
            DetectedType::new(UNRECOGNISED)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Image header check did not complete");
            DetectedType::new(UNRECOGNISED)
        }
    }
}

fn read_image_dimensions(path: &Path, mime: &str) -> Result<(u32, u32), String> {
    let format =
        ImageFormat::from_mime_type(mime).ok_or_else(|| format!("no decoder for {}", mime))?;
    let mut reader = ImageReader::open(path).map_err(|e| e.to_string())?;
    reader.set_format(format);
    reader.into_dimensions().map_err(|e| e.to_string())
}

#[async_trait]
impl ContentInspector for MagicInspector {
    async fn inspect(&self, path: &Path) -> StorageResult<DetectedType> {
        // File::open follows symlinks
        let file = File::open(path).await.map_err(|e| {
            StorageError::InspectFailed(format!("Failed to open {}: {}", path.display(), e))
        })?;

        let meta = file.metadata().await?;
        if !meta.is_file() {
            return Err(StorageError::InspectFailed(format!(
                "{} is not a regular file",
                path.display()
            )));
        }

        let mut head = Vec::with_capacity(SNIFF_LEN);
        file.take(SNIFF_LEN as u64)
            .read_to_end(&mut head)
            .await
            .map_err(|e| {
                StorageError::InspectFailed(format!("Failed to read {}: {}", path.display(), e))
            })?;

        let mut detected = self.classify(&head);
        if detected.is_image() {
            detected = confirm_image_header(path.to_path_buf(), detected).await;
        }
        tracing::debug!(
            path = %path.display(),
            mime_type = %detected.mime_type(),
            "Sniffed stored content"
        );

        Ok(detected)
    }
}
