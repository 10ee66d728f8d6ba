//! Webhook signature verification.
//!
//! Todoist signs every webhook delivery with HMAC-SHA256 over the raw request
//! body, keyed by the app's client secret, and sends the base64 digest in the
//! [`SIGNATURE_HEADER`] header.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the base64-encoded HMAC-SHA256 of the body.
pub const SIGNATURE_HEADER: &str = "X-Todoist-Hmac-Sha256";

/// Checks that `received` is the base64 HMAC-SHA256 of `raw_body` under `secret`.
///
/// Fails closed: a missing signature or one that is not valid base64 is
/// simply a failed verification.
#[must_use]
pub fn verify(raw_body: &[u8], received: Option<&str>, secret: &[u8]) -> bool {
    let Some(received) = received else {
        return false;
    };

    let Some(local) = digest(raw_body, secret) else {
        return false;
    };

    let Ok(received) = STANDARD.decode(received.trim()) else {
        return false;
    };

    constant_time_eq(&local, &received)
}

/// Produces the base64 signature Todoist would send for `raw_body`.
#[must_use]
pub fn sign(raw_body: &[u8], secret: &[u8]) -> String {
    digest(raw_body, secret)
        .map(|d| STANDARD.encode(d))
        .unwrap_or_default()
}

fn digest(raw_body: &[u8], secret: &[u8]) -> Option<Vec<u8>> {
    // HMAC accepts keys of any length; the error arm is unreachable in practice.
    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(raw_body);
    Some(mac.finalize().into_bytes().to_vec())
}

/// Compares two byte strings without short-circuiting on the first mismatch.
///
/// Only the length comparison returns early; the content comparison always
/// touches every byte pair.
#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let diff = a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y));
    std::hint::black_box(diff) == 0
}
