//! Signing and verification of bearer credentials.
//!
//! Credentials keep the payload layout of [`study_sync_core::credential`]
//! and append an HMAC-SHA256 signature over the payload segment:
//!
//! ```text
//! base64(json{id, email?, timestamp}) "." base64url(hmac(payload))
//! ```
//!
//! Unsigned payload-only credentials from older clients are refused unless
//! the codec is built with [`CredentialCodec::accepting_unsigned`].

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;
use std::sync::Arc;
use study_sync_core::UserId;
use study_sync_core::credential::{self, CredentialClaims, WireError};

use crate::error::CredentialError;

type HmacSha256 = Hmac<Sha256>;

/// A credential that passed verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedCredential {
    pub user_id: UserId,
    pub email: Option<String>,
    /// Issuance time in epoch milliseconds.
    pub issued_at_ms: i64,
}

/// Mints and verifies bearer credentials with a shared secret.
#[derive(Clone)]
pub struct CredentialCodec {
    key: Arc<[u8]>,
    accept_unsigned: bool,
}

impl fmt::Debug for CredentialCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialCodec")
            .field("key", &"<redacted>")
            .field("accept_unsigned", &self.accept_unsigned)
            .finish()
    }
}

impl CredentialCodec {
    /// Creates a codec signing with `secret`.
    #[must_use]
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            key: Arc::from(secret.as_ref()),
            accept_unsigned: false,
        }
    }

    /// Whether payload-only credentials without a signature are accepted.
    #[must_use]
    pub fn accepting_unsigned(mut self, accept: bool) -> Self {
        self.accept_unsigned = accept;
        self
    }

    /// Mints a credential for `user_id` stamped with `issued_at`.
    #[must_use]
    pub fn mint(&self, user_id: UserId, email: Option<String>, issued_at: DateTime<Utc>) -> String {
        let payload = CredentialClaims::new(user_id.to_string(), email, issued_at).encode_payload();
        let signature = URL_SAFE_NO_PAD.encode(self.sign(&payload));
        format!("{payload}{}{signature}", credential::SIGNATURE_SEPARATOR)
    }

    /// Verifies `token` at time `now`.
    ///
    /// Order of checks: signature, payload decoding, required claims,
    /// validity window.
    pub fn verify(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<VerifiedCredential, CredentialError> {
        let (payload, signature) = credential::split(token.trim());

        match signature {
            Some(signature) => self.check_signature(payload, signature)?,
            None if self.accept_unsigned => {
                tracing::debug!("accepting unsigned legacy credential");
            }
            None => return Err(CredentialError::BadSignature),
        }

        let claims = credential::decode_payload(payload).map_err(|e| match e {
            WireError::Undecodable => CredentialError::Undecodable,
            WireError::MissingFields => CredentialError::MissingClaims,
        })?;

        let user_id: UserId = claims
            .id
            .parse()
            .map_err(|_| CredentialError::MissingClaims)?;

        if !claims.is_fresh(now) {
            return Err(CredentialError::Expired);
        }

        Ok(VerifiedCredential {
            user_id,
            email: claims.email,
            issued_at_ms: claims.timestamp,
        })
    }

    fn sign(&self, payload: &str) -> Vec<u8> {
        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }

    fn check_signature(&self, payload: &str, signature: &str) -> Result<(), CredentialError> {
        let expected = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| CredentialError::BadSignature)?;
        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        mac.verify_slice(&expected)
            .map_err(|_| CredentialError::BadSignature)
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(&self.key).expect("HMAC can take key of any size")
    }
}
