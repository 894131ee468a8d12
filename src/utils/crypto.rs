// Cryptographic utilities for generating secure tokens

use base64::{engine::general_purpose, Engine as _};
use rand::RngCore;

/// Number of random bytes behind a CSRF state token (192 bits)
pub const STATE_TOKEN_BYTES: usize = 24;

/// Number of random bytes behind a browser session id (256 bits)
pub const SESSION_ID_BYTES: usize = 32;

/// Generate a cryptographically secure CSRF token
///
/// 24 bytes (192 bits) of entropy, `Base64URL` encoded without padding, which
/// keeps the token at 32 characters and safe to embed in a query string.
#[must_use]
pub fn generate_csrf_token() -> String {
    generate_nonce(STATE_TOKEN_BYTES)
}

/// Generate a cryptographically secure nonce of specified byte length
///
/// # Arguments
///
/// * `length` - Number of bytes to generate (recommended: 16-32 for most use cases)
///
/// # Returns
///
/// A base64url-encoded string representing the specified bytes of random data
#[must_use]
pub fn generate_nonce(length: usize) -> String {
    let mut nonce = vec![0u8; length];
    rand::rng().fill_bytes(&mut nonce);
    general_purpose::URL_SAFE_NO_PAD.encode(nonce)
}

/// Constant-time string comparison for secrets supplied by a client
#[must_use]
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_csrf_token_length_and_alphabet() {
        let token = generate_csrf_token();
        // 24 bytes -> 32 base64url chars without padding
        assert_eq!(token.len(), 32);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_csrf_tokens_are_unique() {
        let tokens: HashSet<String> = (0..256).map(|_| generate_csrf_token()).collect();
        assert_eq!(tokens.len(), 256);
    }

    #[test]
    fn test_nonce_decodes_to_requested_length() {
        let nonce = generate_nonce(SESSION_ID_BYTES);
        let decoded = general_purpose::URL_SAFE_NO_PAD.decode(nonce).unwrap();
        assert_eq!(decoded.len(), SESSION_ID_BYTES);
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq("abc", "abc"));
        assert!(!constant_time_eq("abc", "abd"));
        assert!(!constant_time_eq("abc", "abcd"));
        assert!(!constant_time_eq("", "a"));
        assert!(constant_time_eq("", ""));
    }
}
