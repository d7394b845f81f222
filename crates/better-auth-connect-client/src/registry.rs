//! The service registry an application builds once at startup.

use std::sync::Arc;

use better_auth_connect_core::{
    AccountCache, AccountCacheStore, ConnectOptions, FileCacheStore, MemoryCacheStore, Platform,
};

use crate::http::{ApiClient, BetterAuthSessionClient};
use crate::integration::{AccountsView, ErrorCallback, Integration, SessionView};
use crate::service::{ApiKeyService, OAuthService, PlatformService};
use crate::session::{SessionClient, SessionHandle};

/// One service per platform over a shared session handle, account cache and
/// HTTP client.
#[derive(Debug, Clone)]
pub struct Integrations {
    options: Arc<ConnectOptions>,
    session: SessionHandle,
    cache: AccountCache,
    reddit: OAuthService,
    x: OAuthService,
    google: OAuthService,
    devto: ApiKeyService,
    on_error: Option<ErrorCallbackSlot>,
}

#[derive(Clone)]
struct ErrorCallbackSlot(ErrorCallback);

impl std::fmt::Debug for ErrorCallbackSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ErrorCallback")
    }
}

/// The account cache described by `options`: a file store when a cache
/// directory is configured, memory otherwise.
pub fn cache_from_options(options: &ConnectOptions) -> AccountCache {
    let store: Arc<dyn AccountCacheStore> = match &options.cache_dir {
        Some(dir) => Arc::new(FileCacheStore::new(dir.clone())),
        None => Arc::new(MemoryCacheStore::new()),
    };
    AccountCache::new(store).with_enabled(options.account_cache_enabled)
}

impl Integrations {
    /// Talk to the better-auth server at `options.base_url`.
    pub fn new(options: ConnectOptions) -> Self {
        let options = Arc::new(options);
        let api = ApiClient::new(Arc::clone(&options));
        let session_client = Arc::new(BetterAuthSessionClient::new(api.clone()));
        let cache = cache_from_options(&options);
        Self::from_parts(api, session_client, cache)
    }

    /// Assemble from explicit collaborators.
    pub fn from_parts(api: ApiClient, session_client: Arc<dyn SessionClient>, cache: AccountCache) -> Self {
        let options = Arc::new(api.options().clone());
        let session = SessionHandle::with_ttl(session_client, options.session_cache_ttl);

        let oauth = |platform| OAuthService::from_parts(platform, session.clone(), api.clone(), cache.clone());
        let reddit = oauth(Platform::Reddit);
        let x = oauth(Platform::X);
        let google = oauth(Platform::Google);
        let devto = ApiKeyService::new(api.clone(), cache.clone());

        Self {
            options,
            session,
            cache,
            reddit,
            x,
            google,
            devto,
            on_error: None,
        }
    }

    /// Forward every error an [`Integration`] records to `callback`.
    pub fn with_error_callback(mut self, callback: ErrorCallback) -> Self {
        self.on_error = Some(ErrorCallbackSlot(callback));
        self
    }

    pub fn options(&self) -> &ConnectOptions {
        &self.options
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn cache(&self) -> &AccountCache {
        &self.cache
    }

    pub fn reddit(&self) -> &OAuthService {
        &self.reddit
    }

    pub fn x(&self) -> &OAuthService {
        &self.x
    }

    pub fn google(&self) -> &OAuthService {
        &self.google
    }

    pub fn devto(&self) -> &ApiKeyService {
        &self.devto
    }

    /// The OAuth service for `platform`, if it uses OAuth.
    pub fn oauth(&self, platform: Platform) -> Option<&OAuthService> {
        match platform {
            Platform::Reddit => Some(&self.reddit),
            Platform::X => Some(&self.x),
            Platform::Google => Some(&self.google),
            Platform::DevTo => None,
        }
    }

    pub fn service(&self, platform: Platform) -> PlatformService {
        match self.oauth(platform) {
            Some(service) => PlatformService::OAuth(service.clone()),
            None => PlatformService::ApiKey(self.devto.clone()),
        }
    }

    /// Connection state for one platform.
    pub fn integration(&self, platform: Platform) -> Integration {
        Integration::new(self.service(platform), self.on_error.as_ref().map(|slot| slot.0.clone()))
    }

    pub fn accounts_view(&self, platform: Platform) -> AccountsView {
        AccountsView::new(self.service(platform))
    }

    pub fn session_view(&self) -> SessionView {
        SessionView::new(self.session.client().clone())
    }

    /// Drop every cached account list.
    pub async fn clear_cache(&self) {
        self.cache.clear_all().await;
    }
}
