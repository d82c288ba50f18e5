//! Content checksums used as identity keys across runs.

use sha2::{Digest, Sha256};

/// Compute the SHA256 hex digest of a section's content
pub fn checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Cache key for a document-level summary generated with a given context window
pub fn summary_key(document: &str, context_window: u32) -> String {
    checksum(&format!("{}-{}", document, context_window))
}

/// Whether a string looks like a checksum produced by [`checksum`]
pub fn is_checksum(value: &str) -> bool {
    value.len() == 64 && value.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
}
