//! reCAPTCHA v3 token verification for public forms

use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::RecaptchaConfig;
use crate::errors::{Result, TalentenraadError};

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    success: bool,
    #[serde(default)]
    score: Option<f64>,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

pub struct RecaptchaVerifier {
    enabled: bool,
    secret: String,
    verify_url: String,
    min_score: f64,
}

impl RecaptchaVerifier {
    pub fn new(config: &RecaptchaConfig) -> Self {
        if !config.enabled {
            warn!("reCAPTCHA verification is disabled; all form tokens are accepted");
        }
        Self {
            enabled: config.enabled,
            secret: config.secret.clone(),
            verify_url: config.verify_url.clone(),
            min_score: config.min_score,
        }
    }

    /// Verifier that accepts everything
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            secret: String::new(),
            verify_url: String::new(),
            min_score: 0.0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn evaluate(&self, resp: VerifyResponse) -> Result<()> {
        if !resp.success {
            return Err(TalentenraadError::recaptcha(format!(
                "token rejected: {}",
                resp.error_codes.join(", ")
            )));
        }
        if let Some(score) = resp.score
            && score < self.min_score
        {
            return Err(TalentenraadError::recaptcha(format!(
                "score {:.2} below threshold {:.2}",
                score, self.min_score
            )));
        }
        Ok(())
    }

    pub async fn verify(&self, token: &str, remote_ip: Option<&str>) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        if token.trim().is_empty() {
            return Err(TalentenraadError::recaptcha("token is missing".to_string()));
        }

        let url = self.verify_url.clone();
        let mut form = vec![
            ("secret".to_string(), self.secret.clone()),
            ("response".to_string(), token.to_string()),
        ];
        if let Some(ip) = remote_ip {
            form.push(("remoteip".to_string(), ip.to_string()));
        }

        let resp: VerifyResponse = crate::http::blocking(move || {
            let resp = crate::http::agent()
                .post(&url)
                .send_form(form.iter().map(|(k, v)| (k.as_str(), v.as_str())))?;
            Ok(resp.into_body().read_json::<VerifyResponse>()?)
        })
        .await
        .map_err(|e| TalentenraadError::recaptcha(format!("verification unavailable: {}", e)))?;

        debug!("reCAPTCHA verify: success={} score={:?}", resp.success, resp.score);
        self.evaluate(resp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verifier() -> RecaptchaVerifier {
        RecaptchaVerifier::new(&RecaptchaConfig {
            enabled: true,
            secret: "s".into(),
            min_score: 0.5,
            ..Default::default()
        })
    }

    #[test]
    fn test_evaluate_score_threshold() {
        let v = verifier();
        assert!(v
            .evaluate(VerifyResponse { success: true, score: Some(0.9), error_codes: vec![] })
            .is_ok());
        assert!(v
            .evaluate(VerifyResponse { success: true, score: None, error_codes: vec![] })
            .is_ok());
        let err = v
            .evaluate(VerifyResponse { success: true, score: Some(0.1), error_codes: vec![] })
            .unwrap_err();
        assert_eq!(err.code(), "E012");
        assert!(v
            .evaluate(VerifyResponse {
                success: false,
                score: None,
                error_codes: vec!["timeout-or-duplicate".into()]
            })
            .is_err());
    }

    #[tokio::test]
    async fn test_disabled_accepts_everything() {
        assert!(RecaptchaVerifier::disabled().verify("", None).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_token_rejected() {
        assert!(verifier().verify(" ", None).await.is_err());
    }
}
