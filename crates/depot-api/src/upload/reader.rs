//! Bounded extraction of a single file part from a multipart request.

use axum::extract::Request;
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::HeaderMap;
use bytes::Bytes;
use depot_core::{IngestError, IngestResult};
use futures::{Stream, StreamExt};
use multer::{Constraints, Field, Multipart, SizeLimit};

/// A file part located in a multipart body, not yet read.
///
/// The remaining bytes stay behind the whole-body cap that was in force when the part
/// was found, so streaming them can still fail with [`IngestError::BodyTooLarge`].
pub struct FormFile {
    original_name: String,
    declared_content_type: Option<String>,
    limit: u64,
    field: Field<'static>,
}

impl FormFile {
    /// Filename claimed by the client. Untrusted.
    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    /// Content type claimed by the client. Untrusted; never used for acceptance.
    pub fn declared_content_type(&self) -> Option<&str> {
        self.declared_content_type.as_deref()
    }

    /// Consume the part as a stream of chunks.
    pub fn into_stream(self) -> impl Stream<Item = IngestResult<Bytes>> + Send {
        let limit = self.limit;
        self.field
            .map(move |chunk| chunk.map_err(|e| map_multipart_error(e, limit)))
    }
}

/// Find the file part named `field_name`, capping the whole request body at `max_bytes`.
///
/// A declared `Content-Length` above the cap fails immediately. The cap is also
/// applied to the body stream itself before the multipart parser sees it, so a body
/// without a length (or with a wrong one) is cut off as soon as it passes `max_bytes`
/// instead of being buffered. Parts without a filename are not file parts and are
/// skipped, as are parts with other names.
pub async fn read_form_file(
    request: Request,
    field_name: &str,
    max_bytes: u64,
) -> IngestResult<FormFile> {
    let (parts, body) = request.into_parts();

    if let Some(length) = declared_length(&parts.headers) {
        if length > max_bytes {
            return Err(IngestError::BodyTooLarge { limit: max_bytes });
        }
    }

    let content_type = parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| IngestError::Transport("request has no Content-Type".to_string()))?;
    let boundary = multer::parse_boundary(content_type).map_err(|e| {
        IngestError::Transport(format!("request is not multipart/form-data: {}", e))
    })?;

    let constraints = Constraints::new().size_limit(SizeLimit::new().whole_stream(max_bytes));
    let mut multipart =
        Multipart::with_constraints(body.into_data_stream(), boundary, constraints);

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| map_multipart_error(e, max_bytes))?
    {
        if field.name() != Some(field_name) {
            continue;
        }
        let Some(original_name) = field.file_name().map(str::to_string) else {
            continue;
        };

        let declared_content_type = field.content_type().map(|m| m.to_string());
        tracing::debug!(
            field = %field_name,
            original_name = %original_name,
            declared_content_type = ?declared_content_type,
            "Found file part"
        );

        return Ok(FormFile {
            original_name,
            declared_content_type,
            limit: max_bytes,
            field,
        });
    }

    Err(IngestError::field_missing(field_name))
}

fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

fn map_multipart_error(err: multer::Error, limit: u64) -> IngestError {
    match err {
        multer::Error::StreamSizeExceeded { .. } | multer::Error::FieldSizeExceeded { .. } => {
            IngestError::BodyTooLarge { limit }
        }
        other => IngestError::Transport(other.to_string()),
    }
}
