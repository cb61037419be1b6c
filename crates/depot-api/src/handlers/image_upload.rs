use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    Json,
};
use depot_core::ImageResponse;

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::upload;

/// Upload image handler
///
/// Streams the `image` form part into the storage directory and keeps it only if the
/// stored bytes sniff as an image.
///
/// # Errors
/// - `ValidationRejected` - stored content is not an image (HTTP 400)
/// - anything else - transport or storage failure (HTTP 500, details withheld)
#[utoipa::path(
    post,
    path = "/api/v0/images",
    tag = "uploads",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Image stored", body = ImageResponse),
        (status = 400, description = "Upload is not a valid image", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(operation = "upload_image"))]
pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<(StatusCode, Json<ImageResponse>), HttpAppError> {
    let stored = upload::upload_image(
        &state.config.storage_dir,
        state.config.image_max_bytes,
        request,
        state.inspector,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(ImageResponse::from(stored))))
}
