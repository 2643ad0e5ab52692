//! Session tokens of the auth provider
//!
//! The auth provider signs its session cookie as an HS256 JWT with the shared
//! `auth.session_secret`. We only verify it and read the identity.

use base64::Engine;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::RngExt;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::AuthConfig;
use crate::errors::{Result, TalentenraadError};
use crate::storage::UserRole;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    pub exp: i64,
}

/// Authenticated admin user, stored in request extensions by `AdminAuth`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    /// Role of the matching `users` row, if any
    pub role: Option<UserRole>,
    /// Granted through `auth.admin_emails`
    pub allowlisted: bool,
}

/// Random secret (32 bytes, Base64 encoded)
fn generate_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

pub struct SessionVerifier {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl SessionVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Without a configured secret no session can be verified
    pub fn from_config(config: &AuthConfig) -> Self {
        if config.session_secret.is_empty() {
            warn!("auth.session_secret is not configured; admin sessions cannot be verified");
            return Self::new(&generate_secret());
        }
        Self::new(&config.session_secret)
    }

    pub fn verify(&self, token: &str) -> Result<SessionClaims> {
        let data = decode::<SessionClaims>(token, &self.decoding_key, &Validation::default())
            .map_err(|e| TalentenraadError::unauthorized(format!("Invalid session: {}", e)))?;
        if data.claims.email.trim().is_empty() {
            return Err(TalentenraadError::unauthorized(
                "Session has no email".to_string(),
            ));
        }
        Ok(data.claims)
    }

    /// Sign a session token (CLI helper and tests)
    pub fn issue(&self, sub: &str, email: &str, name: Option<&str>, ttl: Duration) -> Result<String> {
        let claims = SessionClaims {
            sub: sub.to_string(),
            email: email.to_string(),
            name: name.map(str::to_string),
            exp: (Utc::now() + ttl).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| TalentenraadError::serialization(format!("Failed to sign session: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_verify() {
        let verifier = SessionVerifier::new("s3cret");
        let token = verifier
            .issue("u1", "voorzitter@talentenraad.be", Some("An"), Duration::hours(1))
            .unwrap();
        let claims = verifier.verify(&token).unwrap();
        assert_eq!(claims.email, "voorzitter@talentenraad.be");
        assert_eq!(claims.name.as_deref(), Some("An"));
    }

    #[test]
    fn test_wrong_secret_and_expired_are_rejected() {
        let token = SessionVerifier::new("a")
            .issue("u1", "x@y.be", None, Duration::hours(1))
            .unwrap();
        assert_eq!(SessionVerifier::new("b").verify(&token).unwrap_err().code(), "E007");

        let verifier = SessionVerifier::new("a");
        let expired = verifier
            .issue("u1", "x@y.be", None, Duration::hours(-2))
            .unwrap();
        assert!(verifier.verify(&expired).is_err());
    }

    #[test]
    fn test_missing_secret_rejects_everything() {
        let verifier = SessionVerifier::from_config(&AuthConfig::default());
        let token = SessionVerifier::new("")
            .issue("u1", "x@y.be", None, Duration::hours(1))
            .unwrap();
        assert!(verifier.verify(&token).is_err());
    }
}
