//! Depot Storage Library
//!
//! Local-filesystem side of an upload: generating the random stored name, streaming
//! the payload into a freshly created file and sniffing what was actually written.
//!
//! # Stored name format
//!
//! - **Image uploads**: `{random_id}_{sanitized_original_name}`
//! - **Plain file uploads**: `{random_id}`
//!
//! `random_id` is always 32 ASCII alphanumerics. Downstream readers may split on the
//! first `_` to recover the sanitized original name. Names never contain a path
//! separator and always resolve directly inside the storage directory.

pub mod inspect;
pub mod local;
pub mod names;
pub mod traits;

// Re-export commonly used types
pub use inspect::{ContentInspector, DetectedType, MagicInspector};
pub use local::{FileWriter, LocalStorage};
pub use traits::{StorageError, StorageResult};
