//! Headless view models for account cards and the API key form.

use std::future::Future;

use better_auth_connect_core::devto::AddedAccount;
use better_auth_connect_core::expiry::{self, DEFAULT_EXPIRY_WARNING_HOURS};
use better_auth_connect_core::{Account, ConnectError, Platform};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::integration::Integration;
use crate::session::User;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "remaining", rename_all = "camelCase")]
pub enum StatusBadge {
    Connected,
    /// Carries the formatted time left.
    ExpiringSoon(String),
    Expired,
}

impl StatusBadge {
    pub fn label(&self) -> String {
        match self {
            StatusBadge::Connected => "Connected".to_string(),
            StatusBadge::ExpiringSoon(remaining) => format!("Expires in {remaining}"),
            StatusBadge::Expired => "Session Expired".to_string(),
        }
    }
}

/// Everything an account card shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub account_id: String,
    pub platform: Platform,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub status: StatusBadge,
    pub time_remaining: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub has_refresh_token: bool,
    pub scopes: Vec<String>,
}

impl AccountSummary {
    pub fn new(platform: Platform, account: &Account, session_user: Option<&User>) -> Self {
        Self::at(platform, account, session_user, Utc::now())
    }

    pub fn at(platform: Platform, account: &Account, session_user: Option<&User>, now: DateTime<Utc>) -> Self {
        let display_name = account
            .username
            .clone()
            .filter(|name| !name.is_empty())
            .or_else(|| session_user.and_then(|u| u.name.clone()).filter(|name| !name.is_empty()))
            .unwrap_or_else(|| format!("{} User", platform.name()));

        let avatar_url = account
            .profile_image_url
            .clone()
            .filter(|url| !url.is_empty())
            .or_else(|| session_user.and_then(|u| u.image.clone()));

        let time_remaining = expiry::time_remaining(account.access_token_expires_at, now);
        let status = if expiry::is_expired_at(account, now) {
            StatusBadge::Expired
        } else if expiry::is_expiring_soon_at(account, DEFAULT_EXPIRY_WARNING_HOURS, now) {
            StatusBadge::ExpiringSoon(time_remaining.clone().unwrap_or_default())
        } else {
            StatusBadge::Connected
        };

        Self {
            account_id: account.id.clone(),
            platform,
            display_name,
            avatar_url,
            status,
            time_remaining,
            expires_at: account.access_token_expires_at,
            has_refresh_token: account.has_refresh_token(),
            scopes: account.scopes(),
        }
    }
}

/// Form state for entering an API key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiKeyInput {
    value: String,
    submitting: bool,
    error: Option<String>,
}

impl ApiKeyInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn can_submit(&self) -> bool {
        !self.submitting && !self.value.trim().is_empty()
    }

    /// Hand the trimmed key to `on_submit`.
    ///
    /// Returns `None` without calling it when the input is blank. The input
    /// is cleared on success and kept, with the error message, on failure.
    pub async fn submit<F, Fut, T>(&mut self, on_submit: F) -> Option<Result<T, ConnectError>>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<T, ConnectError>>,
    {
        let key = self.value.trim().to_string();
        if key.is_empty() {
            return None;
        }

        self.submitting = true;
        self.error = None;
        let result = on_submit(key).await;
        self.submitting = false;

        match &result {
            Ok(_) => self.value.clear(),
            Err(e) => self.error = Some(e.message().to_string()),
        }
        Some(result)
    }

    /// Submit to an API-key integration.
    pub async fn submit_to(&mut self, integration: &Integration) -> Option<Result<AddedAccount, ConnectError>> {
        self.submit(|key| async move { integration.connect_api_key(&key).await }).await
    }
}
