// Connected account model as returned by the account-listing endpoints.
//
// Token fields only ever carry masked placeholders on this side of the API:
// the backend replaces secrets before responding (see `mask_*`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::platform::Platform;

/// Placeholder sent in place of an access token or API key.
pub const MASKED_SECRET: &str = "hidden";

/// Placeholder sent in place of a refresh token that exists.
pub const PRESENT_SECRET: &str = "present";

/// A link between a local user and a provider account.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub user_id: String,
    pub provider_id: String,
    pub account_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub access_token_expires_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Expiry as computed by the server at listing time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_expired: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    // Provider-specific display fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Google services enabled for this account (youtube, blogger, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub services: Option<Vec<String>>,
}

impl Account {
    pub fn new(
        id: impl Into<String>,
        user_id: impl Into<String>,
        provider_id: impl Into<String>,
        account_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            provider_id: provider_id.into(),
            account_id: account_id.into(),
            ..Default::default()
        }
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.access_token_expires_at = Some(expires_at);
        self
    }

    pub fn platform(&self) -> Option<Platform> {
        Platform::from_provider_id(&self.provider_id)
    }

    /// Granted scopes. Providers separate them with spaces or commas.
    pub fn scopes(&self) -> Vec<String> {
        self.scope
            .as_deref()
            .unwrap_or_default()
            .split(|c: char| c == ' ' || c == ',')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn has_refresh_token(&self) -> bool {
        self.refresh_token.is_some()
    }
}

/// Token metadata the backend is allowed to expose for an account.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfo {
    pub access_token_expires_at: Option<DateTime<Utc>>,
    pub is_expired: bool,
    pub has_refresh_token: bool,
}

/// Replace a stored access token with the masked placeholder.
pub fn mask_access_token(token: Option<&str>) -> Option<String> {
    token.map(|_| MASKED_SECRET.to_string())
}

/// Replace a stored refresh token with a presence marker.
pub fn mask_refresh_token(has_refresh_token: bool) -> Option<String> {
    has_refresh_token.then(|| PRESENT_SECRET.to_string())
}
