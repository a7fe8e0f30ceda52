//! Checksum calculation for template fingerprints.

use sha2::{Digest, Sha256};

/// Calculate the SHA-256 checksum of normalized template content.
///
/// # Returns
/// Hexadecimal string representation of the SHA-256 hash.
pub fn calculate_checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
