//! ABOUTME: One-way user-id hashing so traces never carry a reversible identifier

use sha2::{Digest, Sha256};

/// Truncated SHA-256 hex digest of a user id, used for `Trace.user_id_hash`.
/// Sixteen hex characters (64 bits) is enough to de-duplicate per-user
/// metrics without making the trace itself personally identifying.
#[must_use]
pub fn hash_user_id(user_id: &str) -> String {
    let digest = Sha256::digest(user_id.as_bytes());
    let hex = format!("{digest:x}");
    hex[..16].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(hash_user_id("alice"), hash_user_id("alice"));
    }

    #[test]
    fn different_users_hash_differently() {
        assert_ne!(hash_user_id("alice"), hash_user_id("bob"));
    }

    #[test]
    fn hash_is_sixteen_hex_chars() {
        let hash = hash_user_id("alice");
        assert_eq!(hash.len(), 16);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
