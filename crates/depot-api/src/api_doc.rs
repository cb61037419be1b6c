//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use depot_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Depot API",
        version = "0.1.0",
        description = "Multipart upload ingestion into local storage. Image uploads are kept only when the stored bytes are image content."
    ),
    paths(
        handlers::image_upload::upload_image,
        handlers::file_upload::upload_file,
    ),
    components(schemas(
        models::ImageResponse,
        models::FileResponse,
        error::ErrorResponse,
        error::FieldError,
    )),
    tags(
        (name = "uploads", description = "Image and file uploads")
    )
)]
pub struct ApiDoc;

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
