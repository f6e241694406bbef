//! Salted PBKDF2-SHA256 password hashes.
//!
//! Encoded as `pbkdf2_sha256$<iterations>$<salt>$<hash>` with standard
//! base64 for salt and hash, so the iteration count can be raised later
//! without invalidating stored hashes.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;

const ALGORITHM: &str = "pbkdf2_sha256";
pub const SALT_LENGTH: usize = 16;
pub const HASH_LENGTH: usize = 32;

pub fn hash_password(password: &str, iterations: u32) -> String {
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    encode(password, &salt, iterations)
}

fn encode(password: &str, salt: &[u8], iterations: u32) -> String {
    let hash = derive(password, salt, iterations);
    format!("{ALGORITHM}${iterations}${}${}", STANDARD.encode(salt), STANDARD.encode(hash))
}

fn derive(password: &str, salt: &[u8], iterations: u32) -> [u8; HASH_LENGTH] {
    let mut out = [0u8; HASH_LENGTH];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut out);
    out
}

/// Constant-time comparison against a stored hash. Malformed hashes never match.
pub fn verify_password(password: &str, encoded: &str) -> bool {
    let mut parts = encoded.split('$');
    let (Some(ALGORITHM), Some(iter), Some(salt), Some(hash), None) =
        (parts.next(), parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    let (Ok(iterations), Ok(salt), Ok(expected)) =
        (iter.parse::<u32>(), STANDARD.decode(salt), STANDARD.decode(hash))
    else {
        return false;
    };
    if iterations == 0 || expected.len() != HASH_LENGTH {
        return false;
    }
    let actual = derive(password, &salt, iterations);
    actual[..].ct_eq(&expected[..]).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verifies_correct_password_only() {
        let h = hash_password("s3cret-pass", 1_000);
        assert!(verify_password("s3cret-pass", &h));
        assert!(!verify_password("s3cret-pasS", &h));
    }

    #[test]
    fn hash_does_not_contain_plaintext_and_is_salted() {
        let a = hash_password("correct horse", 1_000);
        let b = hash_password("correct horse", 1_000);
        assert!(!a.contains("correct horse"));
        assert_ne!(a, b);
        assert!(a.starts_with("pbkdf2_sha256$1000$"));
    }

    #[test]
    fn deterministic_for_fixed_salt() {
        assert_eq!(encode("pw", b"saltsaltsaltsalt", 10), encode("pw", b"saltsaltsaltsalt", 10));
    }

    #[test]
    fn malformed_hashes_never_match() {
        for bad in ["", "plain", "md5$1$a$b", "pbkdf2_sha256$x$AAAA$AAAA", "pbkdf2_sha256$0$AAAA$AAAA"] {
            assert!(!verify_password("pw", bad), "{bad}");
        }
    }
}
