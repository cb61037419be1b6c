use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    Json,
};
use depot_core::FileResponse;

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::upload;

/// Upload file handler. Stores the `file` form part as-is under a random name.
#[utoipa::path(
    post,
    path = "/api/v0/files",
    tag = "uploads",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "File stored", body = FileResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(operation = "upload_file"))]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<(StatusCode, Json<FileResponse>), HttpAppError> {
    let stored_name =
        upload::upload_file(&state.config.storage_dir, state.config.file_max_bytes, request)
            .await?;

    Ok((StatusCode::CREATED, Json(FileResponse { stored_name })))
}
