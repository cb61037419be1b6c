//! Upload ingestion: bounded multipart extraction and the two ingest pipelines.

mod ingest;
mod reader;

pub use ingest::{upload_file, upload_image};
pub use reader::{read_form_file, FormFile};
