use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

#[derive(Debug, thiserror::Error)]
#[error("Password hashing error: {0}")]
pub struct PasswordError(String);

/// Hash a plaintext password into an argon2 PHC string.
pub fn hash_password(plain: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError(e.to_string()))
}

/// Check a plaintext password against a stored hash.
///
/// An unparseable stored hash verifies as false rather than erroring; the
/// caller treats both the same way (invalid credentials).
pub fn verify_password(plain: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let hash = hash_password("obala-dev-pw").unwrap();
        assert!(verify_password("obala-dev-pw", &hash));
    }

    #[test]
    fn wrong_password_does_not_verify() {
        let hash = hash_password("obala-dev-pw").unwrap();
        assert!(!verify_password("not-the-password", &hash));
    }

    #[test]
    fn malformed_hash_verifies_as_false() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn hashes_are_salted() {
        let first = hash_password("obala-dev-pw").unwrap();
        let second = hash_password("obala-dev-pw").unwrap();
        assert_ne!(first, second);
    }
}
