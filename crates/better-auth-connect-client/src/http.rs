//! reqwest transport: the better-auth session client and the account
//! listing endpoints.
//!
//! Both share one `reqwest::Client` and therefore one cookie jar, so the
//! session cookie set during sign-in authorizes the account calls.

use std::sync::Arc;

use async_trait::async_trait;
use better_auth_connect_core::devto::{
    AddApiKeyRequest, AddApiKeyResponse, AddedAccount, DevToProfile, DEVTO_ACCEPT,
    DEVTO_API_KEY_HEADER,
};
use better_auth_connect_core::{Account, ConnectOptions, Platform};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::ClientError;
use crate::session::{Session, SessionClient, SocialRedirect, SocialRequest, User};

/// Shared HTTP plumbing for every request the services make.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    options: Arc<ConnectOptions>,
}

impl ApiClient {
    pub fn new(options: Arc<ConnectOptions>) -> Self {
        let cookie_store = Arc::new(reqwest::cookie::Jar::default());

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );

        let http = reqwest::Client::builder()
            .cookie_provider(cookie_store)
            .timeout(options.request_timeout)
            .default_headers(headers)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { http, options }
    }

    /// Use a caller-built client, e.g. one with a preloaded cookie jar.
    pub fn with_http_client(http: reqwest::Client, options: Arc<ConnectOptions>) -> Self {
        Self { http, options }
    }

    pub fn options(&self) -> &ConnectOptions {
        &self.options
    }

    pub fn http_client(&self) -> &reqwest::Client {
        &self.http
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}{}", self.options.auth_url(), path)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, ClientError> {
        let resp = request.send().await.map_err(ClientError::network)?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(ClientError::from_status(status.as_u16(), &body))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T, ClientError> {
        let resp = self.send(request).await?;
        Self::read_json(resp).await
    }

    async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ClientError> {
        let body = resp.text().await.map_err(ClientError::network)?;
        let body = if body.trim().is_empty() { "null" } else { body.as_str() };
        serde_json::from_str(body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            ClientError::Deserialization(format!(
                "Failed to deserialize response: {} (body: {})",
                e, preview
            ))
        })
    }

    /// `GET {auth}/{platform}/accounts`.
    pub async fn list_accounts(&self, platform: Platform) -> Result<Vec<Account>, ClientError> {
        let url = self.options.accounts_url(platform);
        tracing::debug!("Fetching accounts from {}", url);
        self.send_json(self.http.get(url)).await
    }

    /// `DELETE {auth}/{platform}/accounts?accountId=`.
    pub async fn delete_account(&self, platform: Platform, account_id: &str) -> Result<(), ClientError> {
        let request = self
            .http
            .delete(self.options.accounts_url(platform))
            .query(&[("accountId", account_id)]);
        self.send(request).await.map(|_| ())
    }

    /// `POST {auth}/devto/accounts` with `{apiKey}`.
    pub async fn add_devto_account(&self, api_key: &str) -> Result<AddedAccount, ClientError> {
        let body = AddApiKeyRequest {
            api_key: Some(api_key.to_string()),
        };
        let request = self
            .http
            .post(self.options.accounts_url(Platform::DevTo))
            .json(&body);
        let resp: AddApiKeyResponse = self.send_json(request).await?;
        Ok(resp.account)
    }

    /// Fetch the Dev.to profile owning `api_key`.
    pub async fn fetch_devto_profile(&self, api_key: &str) -> Result<DevToProfile, ClientError> {
        let request = self
            .http
            .get(&self.options.devto_identity_url)
            .header(DEVTO_API_KEY_HEADER, api_key)
            .header(reqwest::header::ACCEPT, DEVTO_ACCEPT);
        self.send_json(request).await
    }
}

/// better-auth's `{session, user}` payload.
#[derive(Debug, Deserialize)]
struct SessionPayload {
    user: User,
    #[serde(default)]
    session: Option<SessionRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionRecord {
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
}

/// [`SessionClient`] backed by a better-auth server.
#[derive(Debug, Clone)]
pub struct BetterAuthSessionClient {
    api: ApiClient,
}

impl BetterAuthSessionClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    async fn social(&self, path: &str, request: &SocialRequest) -> Result<SocialRedirect, ClientError> {
        let req = self.api.http.post(self.api.auth_url(path)).json(request);
        let redirect: Option<SocialRedirect> = self.api.send_json(req).await?;
        Ok(redirect.unwrap_or_default())
    }
}

#[async_trait]
impl SessionClient for BetterAuthSessionClient {
    async fn get_session(&self) -> Result<Option<Session>, ClientError> {
        let req = self.api.http.get(self.api.auth_url("/session"));
        let payload: Option<SessionPayload> = self.api.send_json(req).await?;
        Ok(payload.map(|p| Session {
            user: p.user,
            expires_at: p.session.and_then(|s| s.expires_at),
        }))
    }

    async fn sign_in_social(&self, request: &SocialRequest) -> Result<SocialRedirect, ClientError> {
        self.social("/sign-in/social", request).await
    }

    async fn link_social(&self, request: &SocialRequest) -> Result<SocialRedirect, ClientError> {
        self.social("/link-social", request).await
    }

    async fn sign_out(&self) -> Result<(), ClientError> {
        let req = self.api.http.post(self.api.auth_url("/sign-out"));
        self.api.send(req).await.map(|_| ())
    }
}
