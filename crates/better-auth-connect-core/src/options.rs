// ConnectOptions: client-side configuration shared by every platform service.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::cache::ACCOUNT_CACHE_TTL;
use crate::env;
use crate::platform::Platform;

pub const DEFAULT_API_BASE_PATH: &str = "/api/auth";
pub const DEFAULT_DEVTO_IDENTITY_URL: &str = "https://dev.to/api/users/me";
pub const SESSION_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone)]
pub struct ConnectOptions {
    /// Origin of the better-auth backend, e.g. `https://app.example.com`.
    /// Empty means relative to wherever requests are sent.
    pub base_url: String,
    pub api_base_path: String,
    pub request_timeout: Duration,
    pub account_cache_ttl: Duration,
    pub account_cache_enabled: bool,
    /// Directory for the durable account cache. `None` keeps it in memory.
    pub cache_dir: Option<PathBuf>,
    pub session_cache_ttl: Duration,
    pub devto_identity_url: String,
    /// Per-platform OAuth callback overrides. Platforms without one use their
    /// registry callback path.
    pub callback_urls: HashMap<Platform, String>,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_base_path: DEFAULT_API_BASE_PATH.to_string(),
            request_timeout: Duration::from_secs(30),
            account_cache_ttl: ACCOUNT_CACHE_TTL,
            account_cache_enabled: true,
            cache_dir: None,
            session_cache_ttl: SESSION_CACHE_TTL,
            devto_identity_url: DEFAULT_DEVTO_IDENTITY_URL.to_string(),
            callback_urls: HashMap::new(),
        }
    }
}

impl ConnectOptions {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Defaults overlaid with `BETTER_AUTH_CONNECT_URL` (or `BETTER_AUTH_URL`),
    /// `BETTER_AUTH_CONNECT_CACHE_TTL_SECS` and `BETTER_AUTH_CONNECT_CACHE_DIR`.
    /// Unparseable values are ignored with a warning.
    pub fn from_env() -> Self {
        let mut options = Self::default();
        if let Some(url) = env::get_url_from_env() {
            options.base_url = url;
        }
        if let Ok(raw) = std::env::var("BETTER_AUTH_CONNECT_CACHE_TTL_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(0) => options.account_cache_enabled = false,
                Ok(secs) => options.account_cache_ttl = Duration::from_secs(secs),
                Err(_) => tracing::warn!(
                    "Ignoring invalid BETTER_AUTH_CONNECT_CACHE_TTL_SECS: {}",
                    raw
                ),
            }
        }
        if let Ok(dir) = std::env::var("BETTER_AUTH_CONNECT_CACHE_DIR") {
            if !dir.trim().is_empty() {
                options.cache_dir = Some(PathBuf::from(dir));
            }
        }
        options
    }

    pub fn with_callback_url(mut self, platform: Platform, url: impl Into<String>) -> Self {
        self.callback_urls.insert(platform, url.into());
        self
    }

    pub fn with_devto_identity_url(mut self, url: impl Into<String>) -> Self {
        self.devto_identity_url = url.into();
        self
    }

    pub fn with_account_cache_ttl(mut self, ttl: Duration) -> Self {
        self.account_cache_ttl = ttl;
        self
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    pub fn without_account_cache(mut self) -> Self {
        self.account_cache_enabled = false;
        self
    }

    /// Base for better-auth endpoints, e.g. `https://host/api/auth`.
    pub fn auth_url(&self) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            self.api_base_path.trim_end_matches('/')
        )
    }

    /// `{auth_url}/{platform}/accounts`.
    pub fn accounts_url(&self, platform: Platform) -> String {
        format!("{}/{}/accounts", self.auth_url(), platform.as_str())
    }

    pub fn callback_url(&self, platform: Platform) -> String {
        match self.callback_urls.get(&platform) {
            Some(url) => url.clone(),
            None => platform.config().callback_path.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ConnectOptions::default();
        assert_eq!(options.api_base_path, "/api/auth");
        assert_eq!(options.account_cache_ttl, Duration::from_secs(300));
        assert_eq!(options.session_cache_ttl, Duration::from_secs(300));
        assert!(options.account_cache_enabled);
        assert_eq!(options.devto_identity_url, "https://dev.to/api/users/me");
    }

    #[test]
    fn test_urls() {
        let options = ConnectOptions::new("https://app.example.com/");
        assert_eq!(options.auth_url(), "https://app.example.com/api/auth");
        assert_eq!(
            options.accounts_url(Platform::X),
            "https://app.example.com/api/auth/x/accounts"
        );
        assert_eq!(
            options.accounts_url(Platform::DevTo),
            "https://app.example.com/api/auth/devto/accounts"
        );
    }

    #[test]
    fn test_callback_override() {
        let options = ConnectOptions::default()
            .with_callback_url(Platform::Google, "https://app.example.com/done");
        assert_eq!(options.callback_url(Platform::Google), "https://app.example.com/done");
        assert_eq!(options.callback_url(Platform::Reddit), "/app/integrations/reddit");
    }
}
