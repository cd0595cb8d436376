//! Compact HMAC-SHA256 signed tokens.
//!
//! Three base64url segments, `header.payload.signature`, with the standard
//! `{"alg":"HS256","typ":"JWT"}` header. Tokens are self-contained: no
//! server-side session exists, and a token stays valid until its encoded
//! expiry passes.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use substation_core::ServiceError;

type HmacSha256 = Hmac<Sha256>;

/// Development fallback secret. The binary warns loudly when this is in use;
/// production deployments must configure their own.
pub const DEV_SECRET: &str = "please-change-secret";

/// Default token lifetime: 8 hours.
pub const DEFAULT_TTL_SECS: i64 = 8 * 60 * 60;

const HEADER_JSON: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

/// Token claims payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: operator username.
    pub sub: String,

    /// Issued at (unix timestamp).
    pub iat: i64,

    /// Expiration (unix timestamp).
    pub exp: i64,
}

/// Stateless token issuer/verifier keyed by a shared server-side secret.
pub struct TokenAuthenticator {
    secret: Vec<u8>,
    ttl_secs: i64,
}

impl TokenAuthenticator {
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
            ttl_secs,
        }
    }

    /// Issue a signed token for an operator that has already been
    /// credential-checked by the caller.
    pub fn issue(&self, username: &str) -> Result<String, ServiceError> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: username.to_string(),
            iat: now,
            exp: now + self.ttl_secs,
        };

        let header = URL_SAFE_NO_PAD.encode(HEADER_JSON);
        let payload = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&claims)
                .map_err(|e| ServiceError::Internal(format!("claims encode failed: {}", e)))?,
        );

        let mut mac = self.mac()?;
        mac.update(header.as_bytes());
        mac.update(b".");
        mac.update(payload.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{}.{}.{}", header, payload, signature))
    }

    /// Verify a token's signature and expiry, returning its claims.
    ///
    /// Fails on anything other than exactly three dot-separated segments, on
    /// a signature mismatch (compared in constant time), and on an expiry in
    /// the past.
    pub fn verify(&self, token: &str) -> Result<Claims, ServiceError> {
        let mut parts = token.split('.');
        let (header, payload, signature) =
            match (parts.next(), parts.next(), parts.next(), parts.next()) {
                (Some(h), Some(p), Some(s), None) => (h, p, s),
                _ => return Err(ServiceError::Unauthorized("malformed token".into())),
            };

        let supplied_sig = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| ServiceError::Unauthorized("malformed token signature".into()))?;

        let mut mac = self.mac()?;
        mac.update(header.as_bytes());
        mac.update(b".");
        mac.update(payload.as_bytes());
        mac.verify_slice(&supplied_sig)
            .map_err(|_| ServiceError::Unauthorized("invalid token signature".into()))?;

        let payload_bytes = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| ServiceError::Unauthorized("malformed token payload".into()))?;
        let claims: Claims = serde_json::from_slice(&payload_bytes)
            .map_err(|_| ServiceError::Unauthorized("malformed token payload".into()))?;

        if claims.exp < chrono::Utc::now().timestamp() {
            return Err(ServiceError::Unauthorized("token expired".into()));
        }

        Ok(claims)
    }

    fn mac(&self) -> Result<HmacSha256, ServiceError> {
        HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| ServiceError::Internal(format!("HMAC init failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authenticator() -> TokenAuthenticator {
        TokenAuthenticator::new("unit-test-secret", DEFAULT_TTL_SECS)
    }

    #[test]
    fn issue_then_verify() {
        let auth = authenticator();
        let token = auth.issue("alice").unwrap();
        let claims = auth.verify(&token).unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.exp, claims.iat + DEFAULT_TTL_SECS);
    }

    #[test]
    fn token_has_three_segments() {
        let auth = authenticator();
        let token = auth.issue("alice").unwrap();
        assert_eq!(token.split('.').count(), 3);
    }

    #[test]
    fn rejects_malformed_tokens() {
        let auth = authenticator();
        assert!(auth.verify("").is_err());
        assert!(auth.verify("only.two").is_err());
        assert!(auth.verify("one.two.three.four").is_err());
        assert!(auth.verify("not-a-token").is_err());
    }

    #[test]
    fn rejects_flipped_signature_character() {
        let auth = authenticator();
        let token = auth.issue("alice").unwrap();

        let mut chars: Vec<char> = token.chars().collect();
        let last = *chars.last().unwrap();
        *chars.last_mut().unwrap() = if last == 'A' { 'B' } else { 'A' };
        let tampered: String = chars.into_iter().collect();

        assert!(auth.verify(&tampered).is_err());
    }

    #[test]
    fn rejects_tampered_payload() {
        let auth = authenticator();
        let token = auth.issue("alice").unwrap();
        let parts: Vec<&str> = token.split('.').collect();

        let forged_payload = URL_SAFE_NO_PAD.encode(
            serde_json::json!({"sub": "mallory", "iat": 0, "exp": i64::MAX}).to_string(),
        );
        let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);
        assert!(auth.verify(&forged).is_err());
    }

    #[test]
    fn rejects_expired_token() {
        let auth = TokenAuthenticator::new("unit-test-secret", -10);
        let token = auth.issue("alice").unwrap();
        let err = auth.verify(&token).unwrap_err();
        assert_eq!(err.to_string(), "token expired");
    }

    #[test]
    fn rejects_token_signed_with_other_secret() {
        let token = TokenAuthenticator::new("secret-a", DEFAULT_TTL_SECS)
            .issue("alice")
            .unwrap();
        let auth = TokenAuthenticator::new("secret-b", DEFAULT_TTL_SECS);
        assert!(auth.verify(&token).is_err());
    }
}
