use base64::{Engine as _, engine::general_purpose};
use rand::RngCore;
use rand::rngs::OsRng;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

/// The size of the CSRF token in bytes.
const CSRF_TOKEN_SIZE: usize = 32;

/// Lifetime of a CSRF token, in seconds.
pub const CSRF_TOKEN_TTL_SECS: u64 = 3600;

/// Generates a new random CSRF token.
///
/// # Returns
///
/// A URL-safe base64-encoded CSRF token.
pub fn generate_csrf_token() -> String {
    let mut token = Zeroizing::new([0u8; CSRF_TOKEN_SIZE]);
    OsRng.fill_bytes(token.as_mut());
    general_purpose::URL_SAFE_NO_PAD.encode(token.as_ref())
}

/// Compares the cookie and header tokens in constant time.
pub fn tokens_match(cookie: &str, header: &str) -> bool {
    cookie.len() == header.len() && bool::from(cookie.as_bytes().ct_eq(header.as_bytes()))
}

/// First characters of a token, for logs.
pub fn token_prefix(token: &str) -> &str {
    token.get(..8).unwrap_or(token)
}
