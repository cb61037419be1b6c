//! Ingest pipelines for image and plain file uploads.
//!
//! Both pipelines return a pure outcome. Turning it into an HTTP response is left to
//! [`crate::error::HttpAppError`].

use crate::constants::{FILE_FIELD, IMAGE_FIELD, INVALID_IMAGE_MESSAGE};
use crate::upload::reader::read_form_file;
use axum::extract::Request;
use chrono::{DateTime, Utc};
use depot_core::{ErrorMetadata, IngestError, IngestResult, LogLevel, StoredFile};
use depot_storage::inspect::ContentInspector;
use depot_storage::{names, LocalStorage};
use std::path::Path;

/// Ingest the `image` part of `request` into `storage_dir`.
///
/// The part is written under `{random_id}_{sanitized original name}` and then sniffed
/// from disk. Only content classified as `image/*` is kept. Any failure after the file
/// was created removes it again.
#[tracing::instrument(
    skip(storage_dir, request, inspector),
    fields(field = IMAGE_FIELD, storage_dir = %storage_dir.display())
)]
pub async fn upload_image(
    storage_dir: &Path,
    max_bytes: u64,
    request: Request,
    inspector: &dyn ContentInspector,
) -> IngestResult<StoredFile> {
    let form = read_form_file(request, IMAGE_FIELD, max_bytes)
        .await
        .inspect_err(|e| report(IMAGE_FIELD, None, e))?;
    let original_name = form.original_name().to_string();
    let declared_content_type = form.declared_content_type().map(str::to_string);

    let random_id = names::random_id()
        .map_err(IngestError::from)
        .inspect_err(|e| report(IMAGE_FIELD, None, e))?;
    let stored_name = names::image_name(&random_id, &original_name);

    let storage = LocalStorage::open(storage_dir)
        .await
        .map_err(IngestError::from)
        .inspect_err(|e| report(IMAGE_FIELD, Some(&stored_name), e))?;
    let mut writer = storage
        .create(&stored_name)
        .await
        .map_err(IngestError::from)
        .inspect_err(|e| report(IMAGE_FIELD, Some(&stored_name), e))?;

    // From here on the file exists and must not outlive a failure.
    let outcome = async {
        writer.copy_stream(form.into_stream()).await?;
        let path = writer.path().to_path_buf();
        let size_bytes = writer.finish().await?;

        // Inspector errors are storage-class and logged at error level, never a rejection.
        let detected = inspector.inspect(&path).await?;

        if !detected.is_image() {
            tracing::debug!(
                stored_name = %stored_name,
                declared_content_type = ?declared_content_type,
                detected_content_type = %detected.mime_type(),
                "Upload is not an image"
            );
            return Err(IngestError::rejected(IMAGE_FIELD, INVALID_IMAGE_MESSAGE));
        }

        let modified_at = modified_at(&storage, &stored_name).await?;

        Ok::<_, IngestError>(StoredFile {
            stored_name: stored_name.clone(),
            original_name: original_name.clone(),
            size_bytes,
            detected_content_type: Some(detected.mime_type().to_string()),
            modified_at,
        })
    }
    .await;

    match outcome {
        Ok(stored) => {
            tracing::info!(
                stored_name = %stored.stored_name,
                size_bytes = stored.size_bytes,
                content_type = ?stored.detected_content_type,
                "Image upload stored"
            );
            Ok(stored)
        }
        Err(e) => {
            report(IMAGE_FIELD, Some(&stored_name), &e);
            storage.discard(&stored_name).await;
            Err(e)
        }
    }
}

/// Ingest the `file` part of `request` into `storage_dir` without inspecting it.
///
/// Returns the stored name, which is the bare random identifier.
#[tracing::instrument(
    skip(storage_dir, request),
    fields(field = FILE_FIELD, storage_dir = %storage_dir.display())
)]
pub async fn upload_file(
    storage_dir: &Path,
    max_bytes: u64,
    request: Request,
) -> IngestResult<String> {
    let form = read_form_file(request, FILE_FIELD, max_bytes)
        .await
        .inspect_err(|e| report(FILE_FIELD, None, e))?;

    let stored_name = names::random_id()
        .map_err(IngestError::from)
        .inspect_err(|e| report(FILE_FIELD, None, e))?;

    let storage = LocalStorage::open(storage_dir)
        .await
        .map_err(IngestError::from)
        .inspect_err(|e| report(FILE_FIELD, Some(&stored_name), e))?;
    let mut writer = storage
        .create(&stored_name)
        .await
        .map_err(IngestError::from)
        .inspect_err(|e| report(FILE_FIELD, Some(&stored_name), e))?;

    let outcome = async {
        writer.copy_stream(form.into_stream()).await?;
        Ok::<_, IngestError>(writer.finish().await?)
    }
    .await;

    match outcome {
        Ok(size_bytes) => {
            tracing::info!(stored_name = %stored_name, size_bytes, "File upload stored");
            Ok(stored_name)
        }
        Err(e) => {
            report(FILE_FIELD, Some(&stored_name), &e);
            storage.discard(&stored_name).await;
            Err(e)
        }
    }
}

async fn modified_at(storage: &LocalStorage, stored_name: &str) -> IngestResult<DateTime<Utc>> {
    let meta = storage.metadata(stored_name).await?;
    let modified = meta.modified().map_err(|e| {
        IngestError::Storage(format!("Failed to read modification time: {}", e))
    })?;
    Ok(DateTime::<Utc>::from(modified))
}

fn report(field: &str, stored_name: Option<&str>, error: &IngestError) {
    let stored_name = stored_name.unwrap_or("-");
    match error.log_level() {
        LogLevel::Debug => tracing::debug!(
            field = %field,
            stored_name = %stored_name,
            error_type = error.error_type(),
            error = %error,
            "Upload rejected"
        ),
        LogLevel::Warn => tracing::warn!(
            field = %field,
            stored_name = %stored_name,
            error_type = error.error_type(),
            error = %error,
            "Upload failed"
        ),
        LogLevel::Error => tracing::error!(
            field = %field,
            stored_name = %stored_name,
            error_type = error.error_type(),
            error = %error,
            "Upload failed"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
    use bytes::Bytes;
    use depot_core::FailureClass;
    use depot_storage::{inspect, DetectedType, StorageError, StorageResult};
    use tempfile::tempdir;

    const BOUNDARY: &str = "ingest-test-boundary";
    const MIB: u64 = 1024 * 1024;

    const PNG: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x02, 0x00, 0x00, 0x00, 0x90,
        0x77, 0x53, 0xDE, 0x00, 0x00, 0x00, 0x0C, 0x49, 0x44, 0x41, 0x54, 0x08, 0xD7, 0x63, 0xF8,
        0xCF, 0xC0, 0x00, 0x00, 0x03, 0x01, 0x01, 0x00, 0x18, 0xDD, 0x8D, 0xB4, 0x00, 0x00, 0x00,
        0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
    ];

    struct BrokenInspector;

    #[async_trait]
    impl ContentInspector for BrokenInspector {
        async fn inspect(&self, _path: &Path) -> StorageResult<DetectedType> {
            Err(StorageError::InspectorUnavailable(
                "signature table failed to load".to_string(),
            ))
        }
    }

    fn multipart_body(field: &str, filename: &str, data: &[u8]) -> Vec<u8> {
        let mut body = format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: image/png\r\n\r\n",
            BOUNDARY, field, filename
        )
        .into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    fn request_with(body: Body, content_length: Option<usize>) -> Request {
        let mut builder = Request::builder().method("POST").uri("/").header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        );
        if let Some(len) = content_length {
            builder = builder.header(CONTENT_LENGTH, len);
        }
        builder.body(body).unwrap()
    }

    fn upload_request(field: &str, filename: &str, data: &[u8]) -> Request {
        let body = multipart_body(field, filename, data);
        let len = body.len();
        request_with(Body::from(body), Some(len))
    }

    fn dir_is_empty(dir: &Path) -> bool {
        std::fs::read_dir(dir).unwrap().next().is_none()
    }

    #[tokio::test]
    async fn png_upload_is_stored() {
        let dir = tempdir().unwrap();
        let req = upload_request("image", "pixel.png", PNG);

        let stored = upload_image(dir.path(), MIB, req, inspect::shared())
            .await
            .unwrap();

        assert_eq!(stored.original_name, "pixel.png");
        assert_eq!(stored.size_bytes, PNG.len() as u64);
        assert_eq!(stored.detected_content_type.as_deref(), Some("image/png"));
        assert_eq!(stored.stored_name.len(), names::RANDOM_ID_LEN + 1 + "pixel.png".len());
        assert!(stored.stored_name.ends_with("_pixel.png"));
        assert!(stored.stored_name[..names::RANDOM_ID_LEN]
            .chars()
            .all(|c| c.is_ascii_alphanumeric()));

        let on_disk = std::fs::read(dir.path().join(&stored.stored_name)).unwrap();
        assert_eq!(on_disk, PNG);
        let detected = inspect::shared()
            .inspect(&dir.path().join(&stored.stored_name))
            .await
            .unwrap();
        assert!(detected.is_image());
    }

    #[tokio::test]
    async fn text_claiming_to_be_png_is_rejected_and_removed() {
        let dir = tempdir().unwrap();
        let req = upload_request("image", "fake.png", b"not-image");

        let err = upload_image(dir.path(), MIB, req, inspect::shared())
            .await
            .unwrap_err();

        assert_eq!(err.class(), FailureClass::Validation);
        assert_eq!(err.field_error(), Some(("image", "must be valid image")));
        assert!(dir_is_empty(dir.path()));
    }

    #[tokio::test]
    async fn text_starting_with_bmp_signature_is_rejected() {
        let dir = tempdir().unwrap();
        let req = upload_request("image", "notes.txt", b"BMW service notes: oil change due");

        let err = upload_image(dir.path(), MIB, req, inspect::shared())
            .await
            .unwrap_err();

        assert_eq!(err.class(), FailureClass::Validation);
        assert!(dir_is_empty(dir.path()));
    }

    #[tokio::test]
    async fn truncated_tiff_is_rejected() {
        let dir = tempdir().unwrap();

        for data in [&b"II*\0 hello"[..], &b"II*\0\x08\0\0\0\x01\0"[..]] {
            let req = upload_request("image", "scan.tiff", data);
            let err = upload_image(dir.path(), MIB, req, inspect::shared())
                .await
                .unwrap_err();

            assert_eq!(err.class(), FailureClass::Validation);
            assert!(dir_is_empty(dir.path()));
        }
    }

    #[tokio::test]
    async fn declared_oversized_body_is_refused() {
        let dir = tempdir().unwrap();
        let payload = vec![0u8; 2 * MIB as usize];
        let req = upload_request("image", "big.png", &payload);

        let err = upload_image(dir.path(), MIB, req, inspect::shared())
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::BodyTooLarge { limit } if limit == MIB));
        assert!(dir_is_empty(dir.path()));
    }

    #[tokio::test]
    async fn chunked_oversized_body_is_cut_off() {
        let dir = tempdir().unwrap();
        let body = multipart_body("file", "big.bin", &vec![7u8; 2 * MIB as usize]);
        let chunks: Vec<Result<Bytes, std::io::Error>> = body
            .chunks(64 * 1024)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        let req = request_with(Body::from_stream(futures::stream::iter(chunks)), None);

        let err = upload_file(dir.path(), MIB, req).await.unwrap_err();

        assert!(matches!(err, IngestError::BodyTooLarge { .. }));
        assert!(dir_is_empty(dir.path()));
    }

    #[tokio::test]
    async fn aborted_body_is_a_transport_error_and_cleaned_up() {
        let dir = tempdir().unwrap();
        let head = format!(
            "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"a.bin\"\r\n\r\n",
            BOUNDARY
        );
        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from(head)),
            Ok(Bytes::from(vec![1u8; 4096])),
            Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "client went away",
            )),
        ];
        let req = request_with(Body::from_stream(futures::stream::iter(chunks)), None);

        let err = upload_file(dir.path(), MIB, req).await.unwrap_err();

        assert_eq!(err.class(), FailureClass::Transport);
        assert!(dir_is_empty(dir.path()));
    }

    #[tokio::test]
    async fn missing_field_creates_nothing() {
        let dir = tempdir().unwrap();
        let req = upload_request("file", "pixel.png", PNG);

        let err = upload_image(dir.path(), MIB, req, inspect::shared())
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::FieldMissing { ref field } if field == "image"));
        assert!(dir_is_empty(dir.path()));
    }

    #[tokio::test]
    async fn non_multipart_request_is_a_transport_error() {
        let dir = tempdir().unwrap();
        let req = Request::builder()
            .method("POST")
            .uri("/")
            .header(CONTENT_TYPE, "text/plain")
            .body(Body::from("hello"))
            .unwrap();

        let err = upload_file(dir.path(), MIB, req).await.unwrap_err();
        assert_eq!(err.class(), FailureClass::Transport);
    }

    #[tokio::test]
    async fn traversal_filename_stays_inside_storage_dir() {
        let dir = tempdir().unwrap();
        let req = upload_request("image", "../../etc/evil.png", PNG);

        let stored = upload_image(dir.path(), MIB, req, inspect::shared())
            .await
            .unwrap();

        assert_eq!(stored.original_name, "../../etc/evil.png");
        assert!(stored.stored_name.ends_with("_evil.png"));
        assert!(!stored.stored_name.contains('/'));
        assert!(dir.path().join(&stored.stored_name).is_file());
    }

    #[tokio::test]
    async fn inspector_failure_is_a_storage_error_not_a_rejection() {
        let dir = tempdir().unwrap();
        let req = upload_request("image", "pixel.png", PNG);

        let err = upload_image(dir.path(), MIB, req, &BrokenInspector)
            .await
            .unwrap_err();

        assert_eq!(err.class(), FailureClass::Storage);
        assert!(err.to_string().contains("signature table"));
        assert!(dir_is_empty(dir.path()));
    }

    #[tokio::test]
    async fn plain_uploads_never_collide() {
        let dir = tempdir().unwrap();

        let first = upload_file(dir.path(), MIB, upload_request("file", "a.txt", b"same"))
            .await
            .unwrap();
        let second = upload_file(dir.path(), MIB, upload_request("file", "a.txt", b"same"))
            .await
            .unwrap();

        assert_ne!(first, second);
        for name in [&first, &second] {
            assert_eq!(name.len(), names::RANDOM_ID_LEN);
            assert_eq!(std::fs::read(dir.path().join(name)).unwrap(), b"same");
        }
    }

    #[tokio::test]
    async fn missing_storage_dir_is_a_storage_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("not-created");
        let req = upload_request("file", "a.txt", b"data");

        let err = upload_file(&missing, MIB, req).await.unwrap_err();

        assert_eq!(err.class(), FailureClass::Storage);
        assert!(!missing.exists());
    }
}
