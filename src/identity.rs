//! Salted client-identity hashing

use sha2::{Digest, Sha256};

/// Hash a raw caller identity with the deployment salt and truncate to
/// 16 hex chars, so raw identifiers never reach storage or logs.
pub fn hashed_client_id(raw: &str, salt: &str) -> String {
    let digest = Sha256::digest(format!("{raw}|{salt}").as_bytes());
    hex::encode(digest)[..16].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_16_lowercase_hex_chars() {
        let id = hashed_client_id("203.0.113.9", "salt");
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(
            hashed_client_id("alice", "salt"),
            hashed_client_id("alice", "salt")
        );
    }

    #[test]
    fn salt_changes_the_hash() {
        assert_ne!(
            hashed_client_id("alice", "salt-a"),
            hashed_client_id("alice", "salt-b")
        );
        assert_ne!(
            hashed_client_id("alice", "salt"),
            hashed_client_id("bob", "salt")
        );
    }
}
