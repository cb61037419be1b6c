//! API constants

/// Versioned prefix for every upload route.
pub const API_PREFIX: &str = "/api/v0";

/// Multipart field carrying an image upload.
pub const IMAGE_FIELD: &str = "image";

/// Multipart field carrying a plain file upload.
pub const FILE_FIELD: &str = "file";

/// Field-scoped message returned when the stored bytes are not an image.
pub const INVALID_IMAGE_MESSAGE: &str = "must be valid image";
