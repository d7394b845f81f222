// Platform registry: static descriptors for every supported provider.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::permission::{
    Permission, DEVTO_PERMISSIONS, GOOGLE_PERMISSIONS, REDDIT_PERMISSIONS, X_PERMISSIONS,
};

/// A third-party platform a user can connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Reddit,
    X,
    #[serde(rename = "devto")]
    DevTo,
    Google,
}

/// How a platform authenticates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthType {
    #[serde(rename = "oauth")]
    OAuth,
    #[serde(rename = "apikey")]
    ApiKey,
}

/// Immutable per-platform descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformConfig {
    pub id: Platform,
    pub name: &'static str,
    pub auth_type: AuthType,
    pub default_scopes: &'static [&'static str],
    pub callback_path: &'static str,
}

impl PlatformConfig {
    pub fn default_scopes(&self) -> Vec<String> {
        self.default_scopes.iter().map(|s| s.to_string()).collect()
    }
}

static REDDIT: PlatformConfig = PlatformConfig {
    id: Platform::Reddit,
    name: "Reddit",
    auth_type: AuthType::OAuth,
    default_scopes: &["identity", "read", "submit", "mysubreddits"],
    callback_path: "/app/integrations/reddit",
};

static X: PlatformConfig = PlatformConfig {
    id: Platform::X,
    name: "X (Twitter)",
    auth_type: AuthType::OAuth,
    default_scopes: &["tweet.read", "tweet.write", "users.read", "offline.access"],
    callback_path: "/app/integrations/x",
};

static DEVTO: PlatformConfig = PlatformConfig {
    id: Platform::DevTo,
    name: "Dev.to",
    auth_type: AuthType::ApiKey,
    default_scopes: &[],
    callback_path: "/app/integrations/devto",
};

static GOOGLE: PlatformConfig = PlatformConfig {
    id: Platform::Google,
    name: "Google",
    auth_type: AuthType::OAuth,
    default_scopes: &[
        "https://www.googleapis.com/auth/userinfo.profile",
        "https://www.googleapis.com/auth/userinfo.email",
    ],
    callback_path: "/app/integrations/google",
};

impl Platform {
    pub const ALL: [Platform; 4] = [Platform::Reddit, Platform::X, Platform::DevTo, Platform::Google];

    /// Identifier used in API paths and cache keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Reddit => "reddit",
            Platform::X => "x",
            Platform::DevTo => "devto",
            Platform::Google => "google",
        }
    }

    pub fn config(&self) -> &'static PlatformConfig {
        match self {
            Platform::Reddit => &REDDIT,
            Platform::X => &X,
            Platform::DevTo => &DEVTO,
            Platform::Google => &GOOGLE,
        }
    }

    pub fn name(&self) -> &'static str {
        self.config().name
    }

    pub fn auth_type(&self) -> AuthType {
        self.config().auth_type
    }

    pub fn is_oauth(&self) -> bool {
        self.auth_type() == AuthType::OAuth
    }

    /// The better-auth provider id. X is registered as `twitter`.
    pub fn provider_id(&self) -> &'static str {
        match self {
            Platform::X => "twitter",
            other => other.as_str(),
        }
    }

    /// Reverse of [`Platform::provider_id`]; accepts `x` as well as `twitter`.
    pub fn from_provider_id(provider_id: &str) -> Option<Platform> {
        match provider_id {
            "twitter" | "x" => Some(Platform::X),
            "reddit" => Some(Platform::Reddit),
            "devto" => Some(Platform::DevTo),
            "google" => Some(Platform::Google),
            _ => None,
        }
    }

    pub fn permissions(&self) -> &'static [Permission] {
        match self {
            Platform::Reddit => REDDIT_PERMISSIONS,
            Platform::X => X_PERMISSIONS,
            Platform::DevTo => DEVTO_PERMISSIONS,
            Platform::Google => GOOGLE_PERMISSIONS,
        }
    }

    /// Marketing bullet points shown on an integration card.
    pub fn features(&self) -> &'static [&'static str] {
        match self {
            Platform::Reddit => &[
                "OAuth2 authentication",
                "Secure token storage in SQLite (Server) & IndexedDB (Client)",
                "Automatic token refresh",
                "Multi-account support",
                "Read, submit, and manage posts",
            ],
            Platform::X => &[
                "OAuth2 authentication",
                "Secure token storage",
                "Automatic token refresh",
                "Multi-account support",
                "Read and post Tweets",
            ],
            Platform::DevTo => &[
                "API key authentication",
                "Secure key storage",
                "Publish articles",
                "Cross-post content",
            ],
            Platform::Google => &[
                "OAuth2 authentication",
                "Secure token storage",
                "Automatic token refresh",
                "Access multiple Google services",
                "YouTube, Blogger, Drive, Gmail, Photos",
            ],
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown platform: {0}")]
pub struct UnknownPlatform(pub String);

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reddit" => Ok(Platform::Reddit),
            "x" => Ok(Platform::X),
            "devto" => Ok(Platform::DevTo),
            "google" => Ok(Platform::Google),
            other => Err(UnknownPlatform(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_identifiers() {
        for platform in Platform::ALL {
            assert_eq!(platform.as_str().parse::<Platform>().unwrap(), platform);
            assert_eq!(platform.config().id, platform);
        }
        assert!("mastodon".parse::<Platform>().is_err());
    }

    #[test]
    fn test_provider_ids() {
        assert_eq!(Platform::X.provider_id(), "twitter");
        assert_eq!(Platform::Reddit.provider_id(), "reddit");
        assert_eq!(Platform::from_provider_id("twitter"), Some(Platform::X));
        assert_eq!(Platform::from_provider_id("github"), None);
    }

    #[test]
    fn test_auth_types() {
        assert!(Platform::Reddit.is_oauth());
        assert!(Platform::Google.is_oauth());
        assert!(!Platform::DevTo.is_oauth());
        assert!(Platform::DevTo.config().default_scopes.is_empty());
    }

    #[test]
    fn test_config_values() {
        let x = Platform::X.config();
        assert_eq!(x.name, "X (Twitter)");
        assert_eq!(x.callback_path, "/app/integrations/x");
        assert_eq!(
            x.default_scopes(),
            vec!["tweet.read", "tweet.write", "users.read", "offline.access"]
        );
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_value(Platform::DevTo).unwrap(), "devto");
        assert_eq!(serde_json::to_value(AuthType::ApiKey).unwrap(), "apikey");
        let p: Platform = serde_json::from_value(serde_json::json!("google")).unwrap();
        assert_eq!(p, Platform::Google);
    }
}
