//! Depot API Library
//!
//! Multipart ingestion for images and plain files, plus the HTTP surface around it.
//! The ingest functions in [`upload`] return a pure outcome; [`error`] turns failures
//! into responses.

mod api_doc;
pub mod constants;
mod handlers;
pub mod setup;
pub mod telemetry;
pub mod upload;

// Public modules
pub mod error;
pub mod state;

// Re-exports
pub use error::{ErrorResponse, FieldError, HttpAppError};
pub use upload::{read_form_file, upload_file, upload_image, FormFile};
