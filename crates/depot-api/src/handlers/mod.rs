pub mod file_upload;
pub mod image_upload;
