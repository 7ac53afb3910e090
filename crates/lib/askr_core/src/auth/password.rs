//! Password verifier handling.
//!
//! Stored verifiers are bcrypt digests and stay opaque outside this
//! module. The cost below only applies when this process creates a
//! digest (store seeding, tests); verification accepts whatever cost
//! the stored digest was produced with.

use super::AuthError;

/// Work factor for digests created here.
const COST: u32 = 10;

/// Digest a new password for storage.
pub fn hash(plain: &str) -> Result<String, AuthError> {
    bcrypt::hash(plain, COST).map_err(digest_error)
}

/// Check a candidate password against a stored digest.
///
/// A wrong password is `Ok(false)`; a digest bcrypt cannot parse is an
/// error, never a silent mismatch.
pub fn verify(candidate: &str, digest: &str) -> Result<bool, AuthError> {
    bcrypt::verify(candidate, digest).map_err(digest_error)
}

fn digest_error(e: bcrypt::BcryptError) -> AuthError {
    AuthError::Encoding(format!("password digest: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn right_password_verifies_wrong_one_does_not() {
        let digest = hash("password123").unwrap();
        assert!(digest.starts_with("$2"));
        assert!(verify("password123", &digest).unwrap());
        assert!(!verify("password124", &digest).unwrap());
    }

    #[test]
    fn garbage_digest_is_an_error_not_a_mismatch() {
        assert!(verify("password123", "not-a-bcrypt-digest").is_err());
    }
}
