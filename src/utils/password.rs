//! Portal password generation and digests

use sha2::{Digest, Sha256};
use uuid::Uuid;

const GENERATED_LENGTH: usize = 16;

/// Random password handed out with a member invite
pub fn generate_password() -> String {
    let mut password = Uuid::new_v4().simple().to_string();
    password.truncate(GENERATED_LENGTH);
    password
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Salted digest in the form `salt$hex`
pub fn hash_password(password: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    format!("{salt}${}", digest(&salt, password))
}

/// Compare without exiting at the first differing byte
fn digests_equal(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    match stored.split_once('$') {
        Some((salt, expected)) => digests_equal(&digest(salt, password), expected),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let stored = hash_password("beet-42");
        assert!(verify_password("beet-42", &stored));
        assert!(!verify_password("beet-43", &stored));
    }

    #[test]
    fn test_same_password_different_salt() {
        assert_ne!(hash_password("kohlrabi"), hash_password("kohlrabi"));
    }

    #[test]
    fn test_generated_password_shape() {
        let password = generate_password();
        assert_eq!(password.len(), GENERATED_LENGTH);
        assert_ne!(password, generate_password());
    }

    #[test]
    fn test_digests_equal() {
        assert!(digests_equal("a1b2", "a1b2"));
        assert!(!digests_equal("a1b2", "a1b3"));
        assert!(!digests_equal("a1b2", "a1b"));
        assert!(!digests_equal("", "a"));
    }

    #[test]
    fn test_truncated_digest_never_verifies() {
        let stored = hash_password("beet-42");
        let truncated = &stored[..stored.len() - 1];
        assert!(!verify_password("beet-42", truncated));
    }

    #[test]
    fn test_malformed_digest_never_verifies() {
        assert!(!verify_password("anything", "no-separator"));
    }
}
