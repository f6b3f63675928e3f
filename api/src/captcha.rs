use std::time::Duration;

use serde::Deserialize;

use crate::error::ApiRequestError;

const VALIDATE_URL: &str = "https://smartcaptcha.yandexcloud.net/validate";
const VALIDATE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum CaptchaError {
    #[error("Please complete the captcha")]
    MissingToken,

    #[error("Captcha check failed, please try again")]
    Rejected,
}

impl ApiRequestError for CaptchaError {}

#[derive(Deserialize)]
struct ValidateResponse {
    status: String,
}

/// Checks SmartCaptcha tokens with the validator service.
///
/// Verification fails open: when the validator is unreachable or answers with
/// a non-200 status the token is accepted.
#[derive(Clone)]
pub struct CaptchaVerifier {
    http: reqwest::Client,
    server_key: Option<String>,
    validate_url: String,
}

impl CaptchaVerifier {
    pub fn new(http: reqwest::Client, server_key: Option<String>) -> Self {
        if server_key.is_none() {
            tracing::warn!("SMARTCAPTCHA_SERVER_KEY is not set, captcha tokens will not be verified");
        }

        CaptchaVerifier {
            http,
            server_key,
            validate_url: VALIDATE_URL.to_string(),
        }
    }

    #[cfg(test)]
    fn with_validate_url(mut self, validate_url: String) -> Self {
        self.validate_url = validate_url;
        self
    }

    pub async fn verify(&self, token: &str) -> Result<(), CaptchaError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(CaptchaError::MissingToken);
        }

        let Some(server_key) = &self.server_key else {
            return Ok(());
        };

        let response = match self
            .http
            .post(&self.validate_url)
            .form(&[("secret", server_key.as_str()), ("token", token)])
            .timeout(VALIDATE_TIMEOUT)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "Captcha validator unreachable, letting the request through");
                return Ok(());
            }
        };

        if response.status() != reqwest::StatusCode::OK {
            tracing::warn!(status = %response.status(), "Captcha validator failed, letting the request through");
            return Ok(());
        }

        match response.json::<ValidateResponse>().await {
            Ok(body) if body.status == "ok" => Ok(()),
            Ok(body) => {
                tracing::debug!(status = %body.status, "Captcha token rejected");
                Err(CaptchaError::Rejected)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Captcha validator sent an unreadable answer");
                Err(CaptchaError::Rejected)
            }
        }
    }
}
