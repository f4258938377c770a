//! Request authentication for the exchange's private endpoints.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Serializes parameters as `key=value` pairs joined by `&`, in insertion
/// order. The exchange signs the exact byte sequence it receives, so the
/// order must not be normalized.
pub fn encode_query(params: &[(String, String)]) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// HMAC-SHA256 over the query string, hex-encoded.
pub fn sign(payload: &str, secret: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Returns the full signed query: the original parameters followed by the
/// `signature` parameter.
pub fn signed_query(params: &[(String, String)], secret: &str) -> String {
    let query = encode_query(params);
    let signature = sign(&query, secret);
    if query.is_empty() {
        format!("signature={signature}")
    } else {
        format!("{query}&signature={signature}")
    }
}
