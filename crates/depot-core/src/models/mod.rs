//! Data models for the application

mod stored_file;

pub use stored_file::*;
