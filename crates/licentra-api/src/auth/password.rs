//! Credential hashing and verification.
//!
//! New credentials are always bcrypt-hashed. Stored hashes are classified by
//! format: 32 lowercase hex characters is the legacy weak digest kept for
//! pre-migration accounts. Legacy digests are verified with a constant-time
//! comparison and upgraded to bcrypt on the next successful login; they are
//! never produced for new credentials.

use licentra_core::AppError;
use md5::{Digest, Md5};
use subtle::ConstantTimeEq;

const LEGACY_DIGEST_LEN: usize = 32;

/// A stored credential hash, tagged by scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialHash {
    Bcrypt(String),
    LegacyDigest(String),
}

impl CredentialHash {
    /// Classify a stored hash by format. 32 hex characters is the legacy
    /// digest; anything else is treated as a bcrypt hash.
    pub fn parse(stored: &str) -> Self {
        if stored.len() == LEGACY_DIGEST_LEN && stored.bytes().all(|b| b.is_ascii_hexdigit()) {
            CredentialHash::LegacyDigest(stored.to_lowercase())
        } else {
            CredentialHash::Bcrypt(stored.to_string())
        }
    }

    /// Verify a plaintext credential against this hash.
    pub fn verify(&self, plain: &str) -> bool {
        match self {
            CredentialHash::Bcrypt(hash) => bcrypt::verify(plain, hash).unwrap_or(false),
            CredentialHash::LegacyDigest(digest) => {
                let computed = hex::encode(Md5::digest(plain.as_bytes()));
                secure_compare(&computed, digest)
            }
        }
    }

    /// Whether the stored hash must be upgraded to the strong scheme.
    pub fn needs_rehash(&self) -> bool {
        matches!(self, CredentialHash::LegacyDigest(_))
    }
}

/// Hash a new credential with the strong scheme.
pub fn hash_password(plain: &str) -> Result<String, AppError> {
    bcrypt::hash(plain, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("Failed to hash credential: {}", e)))
}

/// Generate a temporary password for admin-created customer accounts.
/// Returned once in the creation response; the stored hash is bcrypt.
pub fn generate_temp_password() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let random_bytes: Vec<u8> = (0..9).map(|_| rng.random()).collect();
    hex::encode(random_bytes)
}

fn secure_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legacy_digest(plain: &str) -> String {
        hex::encode(Md5::digest(plain.as_bytes()))
    }

    #[test]
    fn test_hash_and_verify_roundtrip() {
        let hash = hash_password("hunter2-but-longer").unwrap();
        let parsed = CredentialHash::parse(&hash);

        assert!(matches!(parsed, CredentialHash::Bcrypt(_)));
        assert!(parsed.verify("hunter2-but-longer"));
        assert!(!parsed.verify("wrong-password"));
        assert!(!parsed.needs_rehash());
    }

    #[test]
    fn test_legacy_digest_detected_by_format() {
        let digest = legacy_digest("admin123");
        assert_eq!(digest.len(), 32);

        let parsed = CredentialHash::parse(&digest);
        assert!(matches!(parsed, CredentialHash::LegacyDigest(_)));
        assert!(parsed.needs_rehash());
    }

    #[test]
    fn test_legacy_digest_verification() {
        let parsed = CredentialHash::parse(&legacy_digest("admin123"));
        assert!(parsed.verify("admin123"));
        assert!(!parsed.verify("admin1234"));
    }

    #[test]
    fn test_legacy_digest_case_insensitive_storage() {
        let parsed = CredentialHash::parse(&legacy_digest("admin123").to_uppercase());
        assert!(parsed.verify("admin123"));
    }

    #[test]
    fn test_bcrypt_hash_not_mistaken_for_legacy() {
        // A bcrypt hash is 60 characters and contains non-hex characters.
        let hash = hash_password("some-password").unwrap();
        let parsed = CredentialHash::parse(&hash);
        assert!(!parsed.needs_rehash());
    }

    #[test]
    fn test_garbage_hash_verifies_nothing() {
        let parsed = CredentialHash::parse("not-a-real-hash");
        assert!(!parsed.verify("anything"));
    }

    #[test]
    fn test_temp_password_shape() {
        let a = generate_temp_password();
        let b = generate_temp_password();
        assert_eq!(a.len(), 18);
        assert_ne!(a, b);
    }
}
