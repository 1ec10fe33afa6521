//! Bearer credential wire format.
//!
//! A credential is `<payload>[.<signature>]` where `payload` is standard
//! base64 over a JSON object `{ "id", "email"?, "timestamp" }` and
//! `timestamp` is milliseconds since the Unix epoch at issuance. Signing and
//! verification of the optional second segment live in
//! `study-sync-platform-access`; this module only reads and writes the
//! payload, which is all the browser needs to pre-check expiry.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How long a credential stays usable after issuance (24 hours).
pub const VALIDITY_WINDOW_MS: i64 = 24 * 60 * 60 * 1000;

/// Separates the payload segment from the signature segment.
pub const SIGNATURE_SEPARATOR: char = '.';

/// Standard alphabet, padding optional on decode.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Claims carried by a bearer credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialClaims {
    /// Local user identifier, in its rendered (`usr_...`) form.
    pub id: String,
    /// Email known at issuance, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Issuance time in epoch milliseconds.
    pub timestamp: i64,
}

impl CredentialClaims {
    /// Claims for `id` issued at `issued_at`.
    #[must_use]
    pub fn new(id: impl Into<String>, email: Option<String>, issued_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            email,
            timestamp: issued_at.timestamp_millis(),
        }
    }

    /// Age of the credential at `now`, in milliseconds. Negative for
    /// credentials stamped in the future.
    #[must_use]
    pub fn age_ms(&self, now: DateTime<Utc>) -> i64 {
        now.timestamp_millis().saturating_sub(self.timestamp)
    }

    /// True while the credential is inside the validity window.
    #[must_use]
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.age_ms(now) < VALIDITY_WINDOW_MS
    }

    /// Encodes the claims as a payload segment.
    #[must_use]
    pub fn encode_payload(&self) -> String {
        // Serializing a struct of strings and integers cannot fail.
        let json = serde_json::to_vec(self).unwrap_or_default();
        PAYLOAD_ENGINE.encode(json)
    }
}

/// Why a credential payload could not be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireError {
    /// Not base64, or not JSON once decoded.
    Undecodable,
    /// Decoded, but `id` or `timestamp` is missing or has the wrong type.
    MissingFields,
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undecodable => write!(f, "credential payload is not base64-encoded JSON"),
            Self::MissingFields => write!(f, "credential payload lacks id or timestamp"),
        }
    }
}

impl std::error::Error for WireError {}

/// Splits a credential into its payload and optional signature segments.
#[must_use]
pub fn split(token: &str) -> (&str, Option<&str>) {
    match token.split_once(SIGNATURE_SEPARATOR) {
        Some((payload, signature)) => (payload, Some(signature)),
        None => (token, None),
    }
}

/// Decodes a payload segment into claims.
///
/// `id` must be a non-empty string. `timestamp` may be an integer or a
/// float (browsers and older clients emit `Date.now()` as a JSON number).
pub fn decode_payload(payload: &str) -> Result<CredentialClaims, WireError> {
    let bytes = PAYLOAD_ENGINE
        .decode(payload.trim())
        .map_err(|_| WireError::Undecodable)?;
    let value: serde_json::Value =
        serde_json::from_slice(&bytes).map_err(|_| WireError::Undecodable)?;

    let id = value
        .get("id")
        .and_then(serde_json::Value::as_str)
        .filter(|id| !id.is_empty())
        .ok_or(WireError::MissingFields)?;

    let timestamp = value
        .get("timestamp")
        .and_then(|ts| {
            ts.as_i64()
                .or_else(|| ts.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
        })
        .ok_or(WireError::MissingFields)?;

    let email = value
        .get("email")
        .and_then(serde_json::Value::as_str)
        .map(str::to_string);

    Ok(CredentialClaims {
        id: id.to_string(),
        email,
        timestamp,
    })
}

/// Reads the claims of a credential without checking its signature.
///
/// Only suitable for advisory checks such as the client-side expiry
/// pre-check; the server always verifies.
pub fn read_claims(token: &str) -> Result<CredentialClaims, WireError> {
    let (payload, _) = split(token);
    decode_payload(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn legacy_token(json: &str) -> String {
        base64::engine::general_purpose::STANDARD.encode(json)
    }

    #[test]
    fn payload_survives_encoding() {
        let now = Utc::now();
        let claims = CredentialClaims::new("usr_1", Some("ann@example.com".into()), now);
        let decoded = decode_payload(&claims.encode_payload()).expect("decode");
        assert_eq!(decoded, claims);
    }

    #[test]
    fn reads_legacy_unsigned_tokens() {
        let token = legacy_token(r#"{"id":"abc","email":"a@b.c","timestamp":1700000000000}"#);
        let claims = read_claims(&token).expect("claims");
        assert_eq!(claims.id, "abc");
        assert_eq!(claims.email.as_deref(), Some("a@b.c"));
        assert_eq!(claims.timestamp, 1_700_000_000_000);
    }

    #[test]
    fn accepts_float_timestamps_and_missing_padding() {
        let token = legacy_token(r#"{"id":"abc","timestamp":1700000000000.0}"#);
        let unpadded = token.trim_end_matches('=');
        let claims = read_claims(unpadded).expect("claims");
        assert_eq!(claims.timestamp, 1_700_000_000_000);
        assert!(claims.email.is_none());
    }

    #[test]
    fn garbage_is_undecodable() {
        assert_eq!(read_claims("%%%not base64%%%"), Err(WireError::Undecodable));
        assert_eq!(
            read_claims(&legacy_token("this is not json")),
            Err(WireError::Undecodable)
        );
        assert_eq!(read_claims(""), Err(WireError::Undecodable));
    }

    #[test]
    fn missing_fields_are_reported_separately() {
        assert_eq!(
            read_claims(&legacy_token(r#"{"email":"a@b.c","timestamp":1}"#)),
            Err(WireError::MissingFields)
        );
        assert_eq!(
            read_claims(&legacy_token(r#"{"id":"abc"}"#)),
            Err(WireError::MissingFields)
        );
        assert_eq!(
            read_claims(&legacy_token(r#"{"id":"","timestamp":1}"#)),
            Err(WireError::MissingFields)
        );
        assert_eq!(
            read_claims(&legacy_token(r#"{"id":"abc","timestamp":"yesterday"}"#)),
            Err(WireError::MissingFields)
        );
        assert_eq!(read_claims(&legacy_token("[1,2,3]")), Err(WireError::MissingFields));
    }

    #[test]
    fn signature_segment_is_ignored_when_reading() {
        let claims = CredentialClaims::new("usr_1", None, Utc::now());
        let token = format!("{}.c2lnbmF0dXJl", claims.encode_payload());
        assert_eq!(read_claims(&token).expect("claims"), claims);
    }

    #[test]
    fn freshness_boundary() {
        let now = Utc::now();
        let at = |age: Duration| CredentialClaims::new("usr_1", None, now - age);

        assert!(at(Duration::zero()).is_fresh(now));
        assert!(at(Duration::hours(23) + Duration::minutes(59)).is_fresh(now));
        assert!(!at(Duration::hours(24)).is_fresh(now));
        assert!(!at(Duration::hours(24) + Duration::minutes(1)).is_fresh(now));
        assert!(!at(Duration::hours(25)).is_fresh(now));
    }
}
