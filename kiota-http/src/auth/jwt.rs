//! Unverified decoding of JWT claims.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// The registered claims the token providers read.
///
/// Signatures are not verified; the claims only steer client-side caching
/// and endpoint discovery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct JwtClaims {
    /// Issuer URL.
    pub iss: Option<String>,
    /// Authorized party (the client id).
    pub azp: Option<String>,
    /// Expiration as seconds since the Unix epoch.
    pub exp: Option<i64>,
}

impl JwtClaims {
    /// Decodes the payload of `token`.
    ///
    /// Returns `None` unless the token has three parts and a JSON payload.
    pub fn decode(token: &str) -> Option<Self> {
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 3 {
            return None;
        }
        let payload = URL_SAFE_NO_PAD
            .decode(parts[1].trim_end_matches('='))
            .ok()?;
        serde_json::from_slice(&payload).ok()
    }

    /// Returns the expiration instant.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp(self.exp?, 0)
    }
}

#[cfg(test)]
pub(crate) fn encode_unsigned(payload: &str) -> String {
    format!(
        "{}.{}.sig",
        URL_SAFE_NO_PAD.encode(r#"{"alg":"none"}"#),
        URL_SAFE_NO_PAD.encode(payload)
    )
}
