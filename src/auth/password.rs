//! Password hashing with PBKDF2-HMAC-SHA256.
//!
//! Stored format: `pbkdf2-sha256$<iterations>$<salt b64>$<hash b64>`.
//! Verification derives with the stored parameters and compares in
//! constant time.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use subtle::ConstantTimeEq;

const SCHEME: &str = "pbkdf2-sha256";
const ITERATIONS: u32 = 210_000;
const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;

/// Hash a plaintext password with a fresh random salt.
pub fn hash_password(plain: &str) -> String {
    let salt: [u8; SALT_LEN] = rand::random();
    let mut hash = [0u8; HASH_LEN];
    pbkdf2_hmac::<Sha256>(plain.as_bytes(), &salt, ITERATIONS, &mut hash);

    format!(
        "{SCHEME}${ITERATIONS}${}${}",
        URL_SAFE_NO_PAD.encode(salt),
        URL_SAFE_NO_PAD.encode(hash)
    )
}

/// Verify a plaintext password against a stored hash string.
/// Malformed stored values verify as false rather than erroring.
pub fn verify_password(plain: &str, stored: &str) -> bool {
    let mut parts = stored.split('$');
    let (Some(scheme), Some(iterations), Some(salt), Some(hash)) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    if scheme != SCHEME || parts.next().is_some() {
        return false;
    }
    let Ok(iterations) = iterations.parse::<u32>() else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (URL_SAFE_NO_PAD.decode(salt), URL_SAFE_NO_PAD.decode(hash))
    else {
        return false;
    };
    if expected.len() != HASH_LEN {
        return false;
    }

    let mut derived = [0u8; HASH_LEN];
    pbkdf2_hmac::<Sha256>(plain.as_bytes(), &salt, iterations, &mut derived);

    derived.ct_eq(expected.as_slice()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let stored = hash_password("correct horse");
        assert!(verify_password("correct horse", &stored));
    }

    #[test]
    fn wrong_password_rejected() {
        let stored = hash_password("correct horse");
        assert!(!verify_password("battery staple", &stored));
    }

    #[test]
    fn salts_are_unique() {
        let a = hash_password("same");
        let b = hash_password("same");
        assert_ne!(a, b);
        assert!(verify_password("same", &a));
        assert!(verify_password("same", &b));
    }

    #[test]
    fn malformed_stored_value_is_false() {
        assert!(!verify_password("x", ""));
        assert!(!verify_password("x", "plaintext"));
        assert!(!verify_password("x", "pbkdf2-sha256$abc$!!$!!"));
        assert!(!verify_password("x", "md5$1000$AAAA$BBBB"));
    }
}
