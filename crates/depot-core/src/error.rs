//! Error types module
//!
//! Every ingest call ends in exactly one of: a stored file, a validation rejection, a
//! transport failure or a storage failure. The failures are unified under
//! [`IngestError`]; [`IngestError::class`] folds its variants into those three
//! non-success outcomes.
//!
//! Only a validation rejection is meant to reach the client in detail. Every other
//! kind is rendered as a generic server error so that paths and causes stay in the logs.

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like oversized bodies
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// The non-success outcome an [`IngestError`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// The stored bytes failed the content check.
    Validation,
    /// The request could not be read as the expected multipart upload.
    Transport,
    /// Naming, writing, inspecting or stat'ing the stored file failed.
    Storage,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "BODY_TOO_LARGE"), used in logs
    fn error_code(&self) -> &'static str;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details must be hidden from the client
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Form field missing: no file part named '{field}'")]
    FieldMissing { field: String },

    #[error("Request body exceeds limit of {limit} bytes")]
    BodyTooLarge { limit: u64 },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Entropy source error: {0}")]
    EntropySource(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Validation failed for '{field}': {message}")]
    ValidationRejected { field: String, message: String },
}

/// Result type for ingest operations
pub type IngestResult<T> = Result<T, IngestError>;

impl IngestError {
    pub fn field_missing(field: impl Into<String>) -> Self {
        IngestError::FieldMissing {
            field: field.into(),
        }
    }

    pub fn rejected(field: impl Into<String>, message: impl Into<String>) -> Self {
        IngestError::ValidationRejected {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn class(&self) -> FailureClass {
        match self {
            IngestError::ValidationRejected { .. } => FailureClass::Validation,
            IngestError::FieldMissing { .. }
            | IngestError::BodyTooLarge { .. }
            | IngestError::Transport(_) => FailureClass::Transport,
            IngestError::EntropySource(_) | IngestError::Storage(_) => FailureClass::Storage,
        }
    }

    /// Get the error type name for logs
    pub fn error_type(&self) -> &'static str {
        match self {
            IngestError::FieldMissing { .. } => "FieldMissing",
            IngestError::BodyTooLarge { .. } => "BodyTooLarge",
            IngestError::Transport(_) => "Transport",
            IngestError::EntropySource(_) => "EntropySource",
            IngestError::Storage(_) => "Storage",
            IngestError::ValidationRejected { .. } => "ValidationRejected",
        }
    }

    /// Field-scoped validation message, if this is a validation rejection.
    pub fn field_error(&self) -> Option<(&str, &str)> {
        match self {
            IngestError::ValidationRejected { field, message } => Some((field, message)),
            _ => None,
        }
    }
}

impl ErrorMetadata for IngestError {
    fn http_status_code(&self) -> u16 {
        match self.class() {
            FailureClass::Validation => 400,
            FailureClass::Transport | FailureClass::Storage => 500,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            IngestError::FieldMissing { .. } => "FIELD_MISSING",
            IngestError::BodyTooLarge { .. } => "BODY_TOO_LARGE",
            IngestError::Transport(_) => "TRANSPORT_ERROR",
            IngestError::EntropySource(_) => "ENTROPY_SOURCE_ERROR",
            IngestError::Storage(_) => "STORAGE_ERROR",
            IngestError::ValidationRejected { .. } => "VALIDATION_FAILED",
        }
    }

    fn client_message(&self) -> String {
        match self {
            IngestError::ValidationRejected { .. } => "Validation failed".to_string(),
            _ => "Internal server error".to_string(),
        }
    }

    fn is_sensitive(&self) -> bool {
        self.class() != FailureClass::Validation
    }

    fn log_level(&self) -> LogLevel {
        match self {
            IngestError::ValidationRejected { .. } | IngestError::FieldMissing { .. } => {
                LogLevel::Debug
            }
            IngestError::BodyTooLarge { .. } | IngestError::Transport(_) => LogLevel::Warn,
            IngestError::EntropySource(_) | IngestError::Storage(_) => LogLevel::Error,
        }
    }
}
