//! VAPID (RFC 8292) authorization for push services

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use moka::sync::Cache;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::PushConfig;
use crate::errors::{Result, TalentenraadError};

/// Tokens are valid for 12 hours and reused for one of them
const TOKEN_LIFETIME_SECS: i64 = 12 * 60 * 60;
const TOKEN_REUSE_SECS: u64 = 60 * 60;

#[derive(Debug, Serialize, Deserialize)]
pub struct VapidClaims {
    pub aud: String,
    pub exp: i64,
    pub sub: String,
}

pub struct VapidSigner {
    key: EncodingKey,
    public_key: String,
    subject: String,
    /// audience -> signed token
    tokens: Cache<String, String>,
}

impl VapidSigner {
    pub fn new(private_key_pem: &str, public_key: &str, subject: &str) -> Result<Self> {
        let key = EncodingKey::from_ec_pem(private_key_pem.as_bytes()).map_err(|e| {
            TalentenraadError::validation(format!("Invalid VAPID private key: {}", e))
        })?;
        if public_key.is_empty() {
            return Err(TalentenraadError::validation(
                "push.vapid_public_key is not configured".to_string(),
            ));
        }

        Ok(Self {
            key,
            public_key: public_key.to_string(),
            subject: subject.to_string(),
            tokens: Cache::builder()
                .time_to_live(Duration::from_secs(TOKEN_REUSE_SECS))
                .max_capacity(64)
                .build(),
        })
    }

    pub fn from_config(config: &PushConfig) -> Result<Self> {
        Self::new(
            &config.vapid_private_key_pem,
            &config.vapid_public_key,
            &config.vapid_subject,
        )
    }

    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    /// `scheme://host[:port]` of a push endpoint
    pub fn audience(endpoint: &str) -> Result<String> {
        let url = Url::parse(endpoint).map_err(|e| {
            TalentenraadError::validation(format!("Invalid push endpoint '{}': {}", endpoint, e))
        })?;
        if url.scheme() != "https" && url.scheme() != "http" {
            return Err(TalentenraadError::validation(format!(
                "Push endpoint must be http(s): {}",
                endpoint
            )));
        }
        Ok(url.origin().ascii_serialization())
    }

    pub fn sign(&self, audience: &str) -> Result<String> {
        let claims = VapidClaims {
            aud: audience.to_string(),
            exp: Utc::now().timestamp() + TOKEN_LIFETIME_SECS,
            sub: self.subject.clone(),
        };
        encode(&Header::new(Algorithm::ES256), &claims, &self.key)
            .map_err(|e| TalentenraadError::push_delivery(format!("VAPID signing failed: {}", e)))
    }

    /// `Authorization` header value for a push endpoint
    pub fn authorization(&self, endpoint: &str) -> Result<String> {
        let audience = Self::audience(endpoint)?;
        let token = match self.tokens.get(&audience) {
            Some(token) => token,
            None => {
                let token = self.sign(&audience)?;
                self.tokens.insert(audience, token.clone());
                token
            }
        };
        Ok(format!("vapid t={}, k={}", token, self.public_key))
    }
}
