//! HTTP error response conversion
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>`; ingest failures convert
//! into [`HttpAppError`] with `?` and render through one code path.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use depot_core::{ErrorMetadata, IngestError};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    /// Machine-readable error code for programmatic handling
    pub code: String,
    /// Field-scoped validation messages; only present on validation failures
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldError>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Wrapper type for IngestError to implement IntoResponse
/// This is necessary because of Rust's orphan rules - we can't implement
/// IntoResponse (external trait) for IngestError (external type from depot-core)
#[derive(Debug)]
pub struct HttpAppError(pub IngestError);

impl From<IngestError> for HttpAppError {
    fn from(err: IngestError) -> Self {
        HttpAppError(err)
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let error = &self.0;

        let status = StatusCode::from_u16(error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // The ingest functions already logged the cause at its own level.
        tracing::debug!(
            status = status.as_u16(),
            error_type = error.error_type(),
            "Rendering error response"
        );

        // Sensitive errors never carry their cause, path or variant to the client.
        let body = if error.is_sensitive() {
            ErrorResponse {
                error: error.client_message(),
                code: "INTERNAL_ERROR".to_string(),
                fields: Vec::new(),
            }
        } else {
            ErrorResponse {
                error: error.client_message(),
                code: error.error_code().to_string(),
                fields: error
                    .field_error()
                    .map(|(field, message)| FieldError {
                        field: field.to_string(),
                        message: message.to_string(),
                    })
                    .into_iter()
                    .collect(),
            }
        };

        (status, Json(body)).into_response()
    }
}
