use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Salted credential digest: hex(sha256(salt || password)).
pub fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub fn new_salt() -> String {
    Uuid::new_v4().simple().to_string()
}

pub fn verify(salt: &str, password: &str, expected_hash: &str) -> bool {
    // Digests are fixed-length hex; simple comparison suffices here
    digest(salt, password) == expected_hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_verifies_with_same_salt() {
        let salt = new_salt();
        let hash = digest(&salt, "correct horse");
        assert!(verify(&salt, "correct horse", &hash));
        assert!(!verify(&salt, "wrong horse", &hash));
    }

    #[test]
    fn same_password_different_salt_differs() {
        let a = digest(&new_salt(), "sekrit");
        let b = digest(&new_salt(), "sekrit");
        assert_ne!(a, b);
    }
}
