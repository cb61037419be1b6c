//! Stored-name generation.
//!
//! The random part comes straight from the operating system's CSPRNG. If that source
//! fails the ingest must stop before any file is created, so every function here
//! returns before touching the filesystem.

use rand::rngs::OsRng;
use rand::TryRngCore;

use crate::traits::{StorageError, StorageResult};

/// Length of the random identifier at the start of every stored name.
pub const RANDOM_ID_LEN: usize = 32;

/// Longest original-name suffix kept in an image's stored name, in bytes.
pub const MAX_SUFFIX_LEN: usize = 200;

const ALPHABET: &[u8; 62] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

// Largest multiple of 62 that fits in a byte. Bytes at or above it are discarded so
// every symbol is equally likely.
const REJECT_FROM: u8 = 248;

/// Generate a 32-character alphanumeric identifier from the OS random source.
pub fn random_id() -> StorageResult<String> {
    random_id_from(&mut OsRng)
}

/// Generate an identifier from the given random source.
pub fn random_id_from<R: TryRngCore>(rng: &mut R) -> StorageResult<String> {
    let mut id = String::with_capacity(RANDOM_ID_LEN);
    let mut buf = [0u8; 64];

    while id.len() < RANDOM_ID_LEN {
        rng.try_fill_bytes(&mut buf)
            .map_err(|e| StorageError::EntropyUnavailable(e.to_string()))?;

        for byte in buf.iter().copied().filter(|b| *b < REJECT_FROM) {
            id.push(ALPHABET[(byte % 62) as usize] as char);
            if id.len() == RANDOM_ID_LEN {
                break;
            }
        }
    }

    Ok(id)
}

/// Stored name for an image: `{random_id}_{sanitized original name}`.
pub fn image_name(random_id: &str, original_name: &str) -> String {
    format!("{}_{}", random_id, sanitize_original_name(original_name))
}

/// Reduce a client-supplied filename to a single safe path segment.
///
/// Only the last segment survives (`/` and `\` both count as separators). Letters and
/// digits from any script are kept along with `.`, `-` and `_`; everything else
/// becomes `_`. The result is capped at [`MAX_SUFFIX_LEN`] bytes without splitting a
/// character. `.`, `..` and empty names become `file`.
pub fn sanitize_original_name(name: &str) -> String {
    let last_segment = name.rsplit(['/', '\\']).next().unwrap_or(name);

    let mut sanitized = String::with_capacity(last_segment.len().min(MAX_SUFFIX_LEN));
    for c in last_segment.chars() {
        let c = if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
            c
        } else {
            '_'
        };
        if sanitized.len() + c.len_utf8() > MAX_SUFFIX_LEN {
            break;
        }
        sanitized.push(c);
    }

    if sanitized.is_empty() || sanitized == "." || sanitized == ".." {
        return "file".to_string();
    }

    sanitized
}
