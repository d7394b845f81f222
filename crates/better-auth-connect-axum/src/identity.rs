// Dev.to API key verification.

use async_trait::async_trait;
use better_auth_connect_core::devto::{DEVTO_ACCEPT, DEVTO_API_KEY_HEADER};
use better_auth_connect_core::options::DEFAULT_DEVTO_IDENTITY_URL;
use better_auth_connect_core::DevToProfile;

#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("Identity request failed: {0}")]
    Request(String),
}

/// Looks up the profile that owns an API key.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// `Ok(None)` when the key is rejected.
    async fn verify(&self, api_key: &str) -> Result<Option<DevToProfile>, VerifyError>;
}

/// Calls the Forem `users/me` endpoint.
#[derive(Debug, Clone)]
pub struct DevToIdentityVerifier {
    http: reqwest::Client,
    url: String,
}

impl Default for DevToIdentityVerifier {
    fn default() -> Self {
        Self::new(DEFAULT_DEVTO_IDENTITY_URL)
    }
}

impl DevToIdentityVerifier {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
        }
    }

    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }
}

#[async_trait]
impl IdentityVerifier for DevToIdentityVerifier {
    async fn verify(&self, api_key: &str) -> Result<Option<DevToProfile>, VerifyError> {
        let response = self
            .http
            .get(&self.url)
            .header(DEVTO_API_KEY_HEADER, api_key)
            .header(reqwest::header::ACCEPT, DEVTO_ACCEPT)
            .send()
            .await
            .map_err(|e| VerifyError::Request(e.to_string()))?;

        if !response.status().is_success() {
            tracing::debug!("Dev.to rejected API key with {}", response.status());
            return Ok(None);
        }

        let profile = response
            .json::<DevToProfile>()
            .await
            .map_err(|e| VerifyError::Request(e.to_string()))?;
        Ok(Some(profile))
    }
}
