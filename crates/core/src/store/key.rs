//! Row key generation for stored responses.

use sha2::{Digest, Sha256};

/// Compute the row key for a response stored under a tag.
///
/// Request identity is the normalized path; the tag scopes the identity to
/// one cache generation.
pub fn response_key(tag: &str, path: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(tag.as_bytes());
    hasher.update(b"\n");
    hasher.update(path.as_bytes());
    hex::encode(hasher.finalize())
}
