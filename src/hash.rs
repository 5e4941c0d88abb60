// src/hash.rs

//! SHA-256 digests for stored file content
//!
//! Digests are taken over the UTF-8 bytes of the content and written as
//! 64 lowercase hex characters.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 digest of `data` as lowercase hex
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Check text content against an expected digest
///
/// Comparison ignores hex case.
pub fn matches_sha256(content: &str, expected: &str) -> bool {
    sha256_hex(content.as_bytes()).eq_ignore_ascii_case(expected)
}
