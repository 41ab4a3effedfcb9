//! `Stripe-Signature` verification.
//!
//! The provider signs every webhook delivery with HMAC-SHA256 over `"{timestamp}.{body}"`
//! and sends the result in the `Stripe-Signature` header as `t=<unix>,v1=<hex>` (possibly
//! with several `v1` entries during secret rotation). Verification must run against the
//! exact raw body bytes, before any JSON parsing, and uses a constant-time comparison.

use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "Stripe-Signature";

/// How far a delivery's signed timestamp may drift from the server clock before it is
/// rejected as a possible replay.
pub const DEFAULT_TOLERANCE: Duration = Duration::minutes(5);

#[derive(Debug, Clone, Error)]
pub enum SignatureError {
    #[error("Malformed signature header: {0}")]
    MalformedHeader(String),
    #[error("Signature timestamp is outside the accepted tolerance window")]
    TimestampOutOfTolerance,
    #[error("Signature does not match the payload")]
    SignatureMismatch,
}

/// Computes the hex signature for the given timestamp and raw payload. Used by the
/// verifier and by tests that forge deliveries.
pub fn sign_payload(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Builds a complete `Stripe-Signature` header value for a payload.
pub fn signature_header(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    format!("t={timestamp},v1={}", sign_payload(secret, timestamp, payload))
}

/// Verifies a webhook delivery against the endpoint's signing secret.
///
/// Succeeds iff the header parses, the timestamp is within `tolerance` of `now`, and at
/// least one `v1` candidate matches the payload. The comparison is constant-time via
/// [`Mac::verify_slice`].
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance: Duration,
    now: DateTime<Utc>,
) -> Result<(), SignatureError> {
    let mut timestamp = None;
    let mut candidates = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => {
                let t = value
                    .parse::<i64>()
                    .map_err(|_| SignatureError::MalformedHeader(format!("invalid timestamp '{value}'")))?;
                timestamp = Some(t);
            },
            Some(("v1", value)) => {
                let sig = hex::decode(value)
                    .map_err(|_| SignatureError::MalformedHeader("v1 entry is not valid hex".to_string()))?;
                candidates.push(sig);
            },
            // Older scheme versions (v0) and unknown keys are ignored
            Some(_) => {},
            None => return Err(SignatureError::MalformedHeader(format!("'{part}' is not a key=value pair"))),
        }
    }
    let timestamp = timestamp.ok_or_else(|| SignatureError::MalformedHeader("missing t entry".to_string()))?;
    if candidates.is_empty() {
        return Err(SignatureError::MalformedHeader("missing v1 entry".to_string()));
    }
    let age = now.timestamp() - timestamp;
    if age.abs() > tolerance.num_seconds() {
        return Err(SignatureError::TimestampOutOfTolerance);
    }
    let matched = candidates.iter().any(|candidate| {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        mac.verify_slice(candidate).is_ok()
    });
    if matched {
        Ok(())
    } else {
        Err(SignatureError::SignatureMismatch)
    }
}
