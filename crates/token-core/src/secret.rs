//! Token secret generation and hashing
//!
//! Secrets are drawn from the OS CSPRNG: 32 random bytes encoded as
//! URL-safe base64 without padding, 43 printable characters. The store
//! never holds the plaintext — only the SHA-256 digest produced by
//! [`hash`], so no read path can re-expose a secret after the one-time
//! disclosure at creation or regeneration.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use common::Secret;
use rand::RngExt;
use sha2::{Digest, Sha256};

/// Number of random bytes in a generated secret.
const SECRET_BYTES: usize = 32;

/// Encoded length of a generated secret (ceil(32 * 4 / 3), no padding).
pub const SECRET_LEN: usize = 43;

/// Generate a fresh token secret.
///
/// Each call consumes entropy and produces a value distinct from all
/// previous calls with overwhelming probability (256 bits of entropy).
pub fn generate() -> Secret<String> {
    let mut bytes = [0u8; SECRET_BYTES];
    rand::rng().fill(&mut bytes);
    Secret::new(URL_SAFE_NO_PAD.encode(bytes))
}

/// Compute the stored verifier for a secret plaintext.
///
/// `verifier = BASE64URL(SHA256(plaintext))` — comparing an incoming
/// secret against a record only ever needs the digest.
pub fn hash(plaintext: &str) -> String {
    let digest = Sha256::digest(plaintext.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_has_expected_length_and_alphabet() {
        let secret = generate();
        let value = secret.expose();
        assert_eq!(value.len(), SECRET_LEN);
        assert!(
            value
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'),
            "secret must be URL-safe base64 without padding: {value}"
        );
    }

    #[test]
    fn secrets_are_distinct_across_calls() {
        let a = generate();
        let b = generate();
        assert_ne!(a.expose(), b.expose(), "two secrets must not collide");
    }

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(hash("some-secret"), hash("some-secret"));
        assert_ne!(hash("some-secret"), hash("other-secret"));
    }

    #[test]
    fn hash_matches_known_value() {
        // SHA256("hello") = 2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824
        assert_eq!(hash("hello"), "LPJNul-wow4m6DsqxbninhsWHlwfp0JecwQzYpOLmCQ");
    }

    #[test]
    fn hash_does_not_contain_plaintext() {
        let secret = generate();
        let digest = hash(secret.expose());
        assert_ne!(&digest, secret.expose());
        assert_eq!(digest.len(), 43, "SHA-256 digest is 32 bytes -> 43 chars");
    }
}
