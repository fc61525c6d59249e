//! Session token validation
//!
//! Bearer tokens issued by the backend are compact `header.payload.signature`
//! structures. The dashboard never verifies the signature (the backend does
//! that on every request); it only reads the payload's `exp` claim to decide
//! whether a stored token is still worth presenting.
//!
//! Validation is fail-closed: any token that cannot be decoded is reported
//! as expired.

use data_encoding::BASE64URL_NOPAD;
use serde::Deserialize;

/// Claims read from a token payload
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TokenClaims {
    /// Expiry instant in seconds since the epoch
    pub exp: f64,
}

impl TokenClaims {
    /// Expiry instant in milliseconds since the epoch
    pub fn expires_at_millis(&self) -> f64 {
        self.exp * 1000.0
    }
}

/// Reasons a token payload could not be read
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Token must have 3 segments, found {0}")]
    Segments(usize),
    #[error("Token payload is not valid base64: {0}")]
    Encoding(#[from] data_encoding::DecodeError),
    #[error("Token payload is not a valid claims object: {0}")]
    Claims(#[from] serde_json::Error),
}

/// Decode the claims of a token without verifying its signature
pub fn decode_claims(token: &str) -> Result<TokenClaims, TokenError> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(TokenError::Segments(segments.len()));
    }

    let payload = decode_segment(segments[1])?;
    Ok(serde_json::from_slice(&payload)?)
}

/// Decode a base64 segment, accepting both alphabets with or without padding
fn decode_segment(segment: &str) -> Result<Vec<u8>, data_encoding::DecodeError> {
    let normalized: String = segment
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();
    BASE64URL_NOPAD.decode(normalized.as_bytes())
}

/// Check whether a token is expired at the given clock reading
///
/// Returns `true` iff `now_ms` is strictly past `exp * 1000`, or the token
/// cannot be decoded at all.
pub fn is_expired_at(token: &str, now_ms: i64) -> bool {
    match decode_claims(token) {
        Ok(claims) => now_ms as f64 > claims.expires_at_millis(),
        Err(e) => {
            tracing::trace!("Treating undecodable token as expired: {}", e);
            true
        }
    }
}

/// Check whether a token is expired right now
pub fn is_expired(token: &str) -> bool {
    is_expired_at(token, now_millis())
}

/// Current wall-clock time in milliseconds since the epoch
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
pub(crate) fn encode_test_token(payload: &serde_json::Value) -> String {
    let header = BASE64URL_NOPAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let body = BASE64URL_NOPAD.encode(payload.to_string().as_bytes());
    format!("{}.{}.signature", header, body)
}
