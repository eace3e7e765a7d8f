//! Deterministic message hashing: the hash is computed over (type, body,
//! timestamp) at construction time.

use sha2::{Digest, Sha256};

/// Compute the hex-encoded SHA-256 hash of a message's identity fields.
///
/// `type_label` and `timestamp` are the canonical string forms used on the
/// wire; `body_json` is the canonical JSON serialization of the body.
pub fn message_hash(type_label: &str, body_json: &str, timestamp: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(type_label.as_bytes());
    hasher.update(b"|");
    hasher.update(body_json.as_bytes());
    hasher.update(b"|");
    hasher.update(timestamp.as_bytes());
    hex::encode(hasher.finalize())
}
