//! Per-platform auth services.
//!
//! [`OAuthService`] drives the provider handshake through better-auth for
//! Reddit, X and Google. [`ApiKeyService`] stores Dev.to API keys. Both read
//! account lists through the shared [`AccountCache`] and degrade to an empty
//! list when the backend cannot be reached; writes surface [`ConnectError`].

use better_auth_connect_core::devto::{AddedAccount, DevToProfile};
use better_auth_connect_core::{
    Account, AccountCache, AuthType, CachedAccountSet, ConnectError, ConnectOptions, Platform,
};
use serde::Serialize;

use crate::error::ClientError;
use crate::http::ApiClient;
use crate::session::{Session, SessionHandle, SocialRequest};

/// How a connect request reached the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ConnectMode {
    /// Linked to the signed-in user.
    Link,
    /// Signed in (or signed up) with the provider.
    SignIn,
}

/// Result of a connect call. The host follows `redirect_url` to continue
/// the provider handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectIntent {
    pub platform: Platform,
    pub mode: ConnectMode,
    pub redirect_url: Option<String>,
}

/// Fetch the account list, trusting the cache when `accept` says so.
async fn read_accounts(
    platform: Platform,
    api: &ApiClient,
    cache: &AccountCache,
    force_refresh: bool,
    accept: impl Fn(&CachedAccountSet) -> bool,
) -> Vec<Account> {
    if !force_refresh {
        if let Some(cached) = cache.get(platform).await {
            if accept(&cached) {
                tracing::debug!("Serving {} accounts for {} from cache", cached.accounts.len(), platform);
                return cached.accounts;
            }
        }
    }

    match api.list_accounts(platform).await {
        Ok(accounts) => {
            cache.put(platform, accounts.clone()).await;
            accounts
        }
        Err(e) => {
            tracing::warn!("Failed to fetch {} accounts: {}", platform, e);
            Vec::new()
        }
    }
}

/// Map a failed write to the taxonomy: transport failures are network
/// errors, rejected requests carry the server message or `fallback`.
fn write_error(
    err: ClientError,
    fallback: &str,
    rejected: impl FnOnce(Option<String>) -> ConnectError,
) -> ConnectError {
    if err.is_network() {
        return ConnectError::network(Some(err.message().to_string()));
    }
    let message = err.server_message().unwrap_or(fallback).to_string();
    rejected(Some(message))
}

/// OAuth connect/list/disconnect for one platform.
#[derive(Debug, Clone)]
pub struct OAuthService {
    platform: Platform,
    session: SessionHandle,
    api: ApiClient,
    cache: AccountCache,
}

impl OAuthService {
    /// Fails for platforms that do not authenticate with OAuth.
    pub fn new(
        platform: Platform,
        session: SessionHandle,
        api: ApiClient,
        cache: AccountCache,
    ) -> Result<Self, ConnectError> {
        if platform.auth_type() != AuthType::OAuth {
            return Err(ConnectError::connection(
                platform,
                Some(format!("{} does not use OAuth", platform.name())),
            ));
        }
        Ok(Self::from_parts(platform, session, api, cache))
    }

    pub(crate) fn from_parts(
        platform: Platform,
        session: SessionHandle,
        api: ApiClient,
        cache: AccountCache,
    ) -> Self {
        Self {
            platform,
            session,
            api,
            cache,
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    fn options(&self) -> &ConnectOptions {
        self.api.options()
    }

    fn social_request(&self, scopes: Option<Vec<String>>) -> SocialRequest {
        SocialRequest {
            provider: self.platform.provider_id().to_string(),
            callback_url: self.options().callback_url(self.platform),
            scopes: scopes.unwrap_or_else(|| self.platform.config().default_scopes()),
        }
    }

    /// Link the provider to the signed-in user, or sign in with it when
    /// nobody is signed in. `None` scopes means the platform defaults.
    pub async fn connect(&self, scopes: Option<Vec<String>>) -> Result<ConnectIntent, ConnectError> {
        let request = self.social_request(scopes);
        let client = self.session.client();
        let to_connect_error = |e: ClientError| ConnectError::connection(self.platform, Some(e.message().to_string()));

        let session = client.get_session().await.map_err(to_connect_error)?;
        let (mode, redirect) = match session {
            Some(_) => (ConnectMode::Link, client.link_social(&request).await),
            None => (ConnectMode::SignIn, client.sign_in_social(&request).await),
        };
        let redirect = redirect.map_err(to_connect_error)?;

        tracing::info!("Starting {:?} for {} via {}", mode, self.platform, request.provider);
        Ok(ConnectIntent {
            platform: self.platform,
            mode,
            redirect_url: redirect.url,
        })
    }

    /// Always sign in with the provider, regardless of the current session.
    pub async fn sign_in(&self, scopes: Option<Vec<String>>) -> Result<ConnectIntent, ConnectError> {
        let request = self.social_request(scopes);
        let redirect = self
            .session
            .client()
            .sign_in_social(&request)
            .await
            .map_err(|e| ConnectError::connection(self.platform, Some(e.message().to_string())))?;
        Ok(ConnectIntent {
            platform: self.platform,
            mode: ConnectMode::SignIn,
            redirect_url: redirect.url,
        })
    }

    pub async fn sign_out(&self) -> Result<(), ConnectError> {
        self.session
            .sign_out()
            .await
            .map_err(|e| ConnectError::session(Some(e.message().to_string())))
    }

    pub async fn get_session(&self) -> Result<Option<Session>, ConnectError> {
        self.session.get().await
    }

    /// Connected accounts. The cache is used only while it is within its TTL
    /// and every cached token is still valid.
    pub async fn get_accounts(&self, force_refresh: bool) -> Vec<Account> {
        let ttl = self.options().account_cache_ttl;
        read_accounts(self.platform, &self.api, &self.cache, force_refresh, |cached| {
            cached.is_valid(ttl) && cached.all_tokens_valid()
        })
        .await
    }

    /// Remove an account on the backend. The cache is only cleared once the
    /// backend confirms.
    pub async fn disconnect(&self, account_id: &str) -> Result<(), ConnectError> {
        let platform = self.platform;
        self.api
            .delete_account(platform, account_id)
            .await
            .map_err(|e| {
                write_error(e, "Failed to disconnect account", |m| ConnectError::connection(platform, m))
            })?;
        self.cache.clear(platform).await;
        Ok(())
    }

    pub async fn clear_cache(&self) {
        self.cache.clear(self.platform).await;
    }
}

/// Dev.to API-key accounts.
#[derive(Debug, Clone)]
pub struct ApiKeyService {
    platform: Platform,
    api: ApiClient,
    cache: AccountCache,
}

impl ApiKeyService {
    pub fn new(api: ApiClient, cache: AccountCache) -> Self {
        Self {
            platform: Platform::DevTo,
            api,
            cache,
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// The profile owning `api_key`, or `None` if the key is rejected or the
    /// identity endpoint cannot be reached.
    pub async fn validate_api_key(&self, api_key: &str) -> Option<DevToProfile> {
        match self.api.fetch_devto_profile(api_key).await {
            Ok(profile) => Some(profile),
            Err(e) => {
                tracing::debug!("Dev.to API key validation failed: {}", e);
                None
            }
        }
    }

    /// Validate `api_key`, then ask the backend to store it.
    pub async fn add_account(&self, api_key: &str) -> Result<AddedAccount, ConnectError> {
        let platform = self.platform;
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(ConnectError::api_key(platform, Some("API key is required".to_string())));
        }
        if self.validate_api_key(api_key).await.is_none() {
            return Err(ConnectError::api_key(platform, None));
        }

        let account = self
            .api
            .add_devto_account(api_key)
            .await
            .map_err(|e| write_error(e, "Failed to add Dev.to account", |m| ConnectError::api_key(platform, m)))?;

        self.cache.clear(platform).await;
        tracing::info!("Stored Dev.to account {}", account.username);
        Ok(account)
    }

    /// Same as [`ApiKeyService::add_account`].
    pub async fn connect(&self, api_key: &str) -> Result<AddedAccount, ConnectError> {
        self.add_account(api_key).await
    }

    /// Stored accounts. API keys carry no expiry, so the cache is trusted for
    /// its whole TTL.
    pub async fn get_accounts(&self, force_refresh: bool) -> Vec<Account> {
        let ttl = self.api.options().account_cache_ttl;
        read_accounts(self.platform, &self.api, &self.cache, force_refresh, |cached| {
            cached.is_valid(ttl)
        })
        .await
    }

    pub async fn remove_account(&self, account_id: &str) -> Result<(), ConnectError> {
        let platform = self.platform;
        self.api
            .delete_account(platform, account_id)
            .await
            .map_err(|e| write_error(e, "Failed to remove account", |m| ConnectError::connection(platform, m)))?;
        self.cache.clear(platform).await;
        Ok(())
    }

    /// Same as [`ApiKeyService::remove_account`].
    pub async fn disconnect(&self, account_id: &str) -> Result<(), ConnectError> {
        self.remove_account(account_id).await
    }

    pub async fn clear_cache(&self) {
        self.cache.clear(self.platform).await;
    }
}

/// Either kind of service, for code that handles every platform alike.
#[derive(Debug, Clone)]
pub enum PlatformService {
    OAuth(OAuthService),
    ApiKey(ApiKeyService),
}

impl PlatformService {
    pub fn platform(&self) -> Platform {
        match self {
            Self::OAuth(s) => s.platform(),
            Self::ApiKey(s) => s.platform(),
        }
    }

    pub async fn get_accounts(&self, force_refresh: bool) -> Vec<Account> {
        match self {
            Self::OAuth(s) => s.get_accounts(force_refresh).await,
            Self::ApiKey(s) => s.get_accounts(force_refresh).await,
        }
    }

    pub async fn disconnect(&self, account_id: &str) -> Result<(), ConnectError> {
        match self {
            Self::OAuth(s) => s.disconnect(account_id).await,
            Self::ApiKey(s) => s.disconnect(account_id).await,
        }
    }

    pub async fn clear_cache(&self) {
        match self {
            Self::OAuth(s) => s.clear_cache().await,
            Self::ApiKey(s) => s.clear_cache().await,
        }
    }
}
