//! Depot Core Library
//!
//! This crate provides the domain models, the ingest error taxonomy and the runtime
//! configuration shared by the storage and API crates.

pub mod config;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::Config;
pub use error::{ErrorMetadata, FailureClass, IngestError, IngestResult, LogLevel};
pub use models::{FileResponse, ImageResponse, StoredFile};
