// Request session lookup for the account routes.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::HeaderMap;
use tokio::sync::RwLock;

/// Default better-auth cookie prefix.
pub const DEFAULT_COOKIE_PREFIX: &str = "better-auth";

/// Resolves the signed-in user for a request.
#[async_trait]
pub trait SessionResolver: Send + Sync {
    /// The user id behind the request, or `None` when nobody is signed in.
    async fn user_id(&self, headers: &HeaderMap) -> Option<String>;
}

/// Pull the session token out of `Authorization: Bearer` or the
/// `{prefix}.session_token` cookie (plain or `__Secure-` prefixed).
pub fn extract_session_token(headers: &HeaderMap, prefix: &str) -> Option<String> {
    if let Some(token) = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    {
        return Some(token.to_string());
    }

    let cookies = headers.get("cookie")?.to_str().ok()?;
    let cookie_name = format!("{}.session_token", prefix);
    let secure_cookie_name = format!("__Secure-{}", cookie_name);

    cookies
        .split(';')
        .filter_map(|cookie| cookie.trim().split_once('='))
        .find(|(name, _)| {
            let name = name.trim();
            name == cookie_name || name == secure_cookie_name
        })
        .map(|(_, value)| value.to_string())
}

/// Session tokens held in memory, mapped to user ids.
#[derive(Debug, Clone)]
pub struct MemorySessionResolver {
    prefix: String,
    sessions: Arc<RwLock<HashMap<String, String>>>,
}

impl Default for MemorySessionResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySessionResolver {
    pub fn new() -> Self {
        Self::with_prefix(DEFAULT_COOKIE_PREFIX)
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn insert(&self, token: impl Into<String>, user_id: impl Into<String>) {
        self.sessions.write().await.insert(token.into(), user_id.into());
    }

    pub async fn remove(&self, token: &str) {
        self.sessions.write().await.remove(token);
    }
}

#[async_trait]
impl SessionResolver for MemorySessionResolver {
    async fn user_id(&self, headers: &HeaderMap) -> Option<String> {
        let token = extract_session_token(headers, &self.prefix)?;
        self.sessions.read().await.get(&token).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer tok-a"));
        headers.insert("cookie", HeaderValue::from_static("better-auth.session_token=tok-b"));
        assert_eq!(extract_session_token(&headers, "better-auth").as_deref(), Some("tok-a"));
    }

    #[test]
    fn test_secure_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "cookie",
            HeaderValue::from_static("theme=dark; __Secure-app.session_token=tok-c"),
        );
        assert_eq!(extract_session_token(&headers, "app").as_deref(), Some("tok-c"));
        assert_eq!(extract_session_token(&headers, "better-auth"), None);
    }

    #[tokio::test]
    async fn test_memory_resolver() {
        let resolver = MemorySessionResolver::new();
        resolver.insert("tok", "user-1").await;

        let mut headers = HeaderMap::new();
        headers.insert("cookie", HeaderValue::from_static("better-auth.session_token=tok"));
        assert_eq!(resolver.user_id(&headers).await.as_deref(), Some("user-1"));

        resolver.remove("tok").await;
        assert_eq!(resolver.user_id(&headers).await, None);
    }
}
