// Error taxonomy for account connections.
//
// Write-path failures (connect, disconnect, add account) surface as
// `ConnectError`. Read-path and cache failures are logged and swallowed by the
// callers, so `CacheError` never leaves the cache layer.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::platform::Platform;

/// Stable error codes, one per `ConnectError` variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ConnectionError,
    SessionError,
    ApiKeyError,
    NetworkError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConnectionError => "CONNECTION_ERROR",
            Self::SessionError => "SESSION_ERROR",
            Self::ApiKeyError => "API_KEY_ERROR",
            Self::NetworkError => "NETWORK_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced to the integration layer.
///
/// `Clone` so that a single session lookup outcome can be handed to every
/// caller waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectError {
    /// Connect or disconnect against a platform failed.
    #[error("{message}")]
    Connection { platform: Platform, message: String },

    /// The session lookup failed.
    #[error("{0}")]
    Session(String),

    /// An API key was rejected by the provider or the backend.
    #[error("{message}")]
    ApiKey { platform: Platform, message: String },

    /// Generic transport failure.
    #[error("{0}")]
    Network(String),
}

impl ConnectError {
    /// Connection error, falling back to `Failed to connect to {platform}`.
    pub fn connection(platform: Platform, message: Option<String>) -> Self {
        Self::Connection {
            message: message.unwrap_or_else(|| format!("Failed to connect to {}", platform)),
            platform,
        }
    }

    /// Session error, falling back to `Session error`.
    pub fn session(message: Option<String>) -> Self {
        Self::Session(message.unwrap_or_else(|| "Session error".to_string()))
    }

    /// API key error, falling back to `Invalid API key for {platform}`.
    pub fn api_key(platform: Platform, message: Option<String>) -> Self {
        Self::ApiKey {
            message: message.unwrap_or_else(|| format!("Invalid API key for {}", platform)),
            platform,
        }
    }

    /// Network error, falling back to `Network error`.
    pub fn network(message: Option<String>) -> Self {
        Self::Network(message.unwrap_or_else(|| "Network error".to_string()))
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Connection { .. } => ErrorCode::ConnectionError,
            Self::Session(_) => ErrorCode::SessionError,
            Self::ApiKey { .. } => ErrorCode::ApiKeyError,
            Self::Network(_) => ErrorCode::NetworkError,
        }
    }

    /// The platform the error is scoped to, if any.
    pub fn platform(&self) -> Option<Platform> {
        match self {
            Self::Connection { platform, .. } | Self::ApiKey { platform, .. } => Some(*platform),
            _ => None,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Connection { message, .. } | Self::ApiKey { message, .. } => message,
            Self::Session(message) | Self::Network(message) => message,
        }
    }
}

/// Failures inside an `AccountCacheStore`.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache read failed: {0}")]
    Read(String),

    #[error("Cache write failed: {0}")]
    Write(String),

    #[error("Cache entry could not be decoded: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConnectError>;
