//! Session access for the platform services.
//!
//! [`SessionClient`] is the seam to better-auth's session endpoints.
//! [`SessionHandle`] wraps one with a short-lived cache and collapses
//! concurrent lookups into a single request.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use better_auth_connect_core::options::SESSION_CACHE_TTL;
use better_auth_connect_core::ConnectError;
use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::{Deserialize, Serialize};

use crate::error::ClientError;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// The signed-in user as seen by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user: User,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Body of `POST /sign-in/social` and `POST /link-social`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialRequest {
    pub provider: String,
    #[serde(rename = "callbackURL")]
    pub callback_url: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<String>,
}

/// Where the provider handshake continues.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SocialRedirect {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<bool>,
}

/// The subset of the better-auth client the services depend on.
#[async_trait]
pub trait SessionClient: Send + Sync {
    /// `Ok(None)` when nobody is signed in.
    async fn get_session(&self) -> Result<Option<Session>, ClientError>;

    async fn sign_in_social(&self, request: &SocialRequest) -> Result<SocialRedirect, ClientError>;

    async fn link_social(&self, request: &SocialRequest) -> Result<SocialRedirect, ClientError>;

    async fn sign_out(&self) -> Result<(), ClientError>;
}

type SessionLookup = Shared<BoxFuture<'static, Result<Option<Session>, ConnectError>>>;

#[derive(Default)]
struct SessionState {
    cached: Option<(Option<Session>, Instant)>,
    in_flight: Option<SessionLookup>,
    /// Bumped on every invalidation so that a lookup started before it
    /// cannot repopulate the cache afterwards.
    generation: u64,
}

fn lock(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Cached, de-duplicated access to the current session.
///
/// Clones share the cache and the in-flight slot.
#[derive(Clone)]
pub struct SessionHandle {
    client: Arc<dyn SessionClient>,
    state: Arc<Mutex<SessionState>>,
    ttl: Duration,
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle").field("ttl", &self.ttl).finish()
    }
}

impl SessionHandle {
    pub fn new(client: Arc<dyn SessionClient>) -> Self {
        Self::with_ttl(client, SESSION_CACHE_TTL)
    }

    pub fn with_ttl(client: Arc<dyn SessionClient>, ttl: Duration) -> Self {
        Self {
            client,
            state: Arc::new(Mutex::new(SessionState::default())),
            ttl,
        }
    }

    pub fn client(&self) -> &Arc<dyn SessionClient> {
        &self.client
    }

    /// The current session.
    ///
    /// A cached answer younger than the TTL is returned as is. Otherwise
    /// callers arriving while a lookup is outstanding share its result.
    pub async fn get(&self) -> Result<Option<Session>, ConnectError> {
        let lookup = {
            let mut state = lock(&self.state);
            if let Some((session, fetched_at)) = &state.cached {
                if fetched_at.elapsed() < self.ttl {
                    return Ok(session.clone());
                }
            }
            match &state.in_flight {
                Some(lookup) => lookup.clone(),
                None => {
                    let lookup = self.start_lookup(state.generation);
                    state.in_flight = Some(lookup.clone());
                    lookup
                }
            }
        };
        lookup.await
    }

    fn start_lookup(&self, generation: u64) -> SessionLookup {
        let client = Arc::clone(&self.client);
        let state = Arc::clone(&self.state);
        async move {
            let result = client.get_session().await;
            let mut state = lock(&state);
            let current = state.generation == generation;
            if current {
                state.in_flight = None;
            }
            match result {
                Ok(session) => {
                    if current {
                        state.cached = Some((session.clone(), Instant::now()));
                    }
                    Ok(session)
                }
                Err(e) => {
                    tracing::debug!("Session lookup failed: {}", e);
                    Err(ConnectError::session(Some(e.message().to_string())))
                }
            }
        }
        .boxed()
        .shared()
    }

    /// Drop the cached session and detach any outstanding lookup.
    pub fn invalidate(&self) {
        let mut state = lock(&self.state);
        state.cached = None;
        state.in_flight = None;
        state.generation = state.generation.wrapping_add(1);
    }

    /// Sign out on the server, then forget the cached session.
    pub async fn sign_out(&self) -> Result<(), ClientError> {
        let result = self.client.sign_out().await;
        self.invalidate();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingClient {
        calls: AtomicUsize,
        delay: Duration,
        fail: bool,
    }

    impl CountingClient {
        fn new(delay: Duration, fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                delay,
                fail,
            })
        }
    }

    #[async_trait]
    impl SessionClient for CountingClient {
        async fn get_session(&self) -> Result<Option<Session>, ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if self.fail {
                return Err(ClientError::Network("connection refused".into()));
            }
            Ok(Some(Session {
                user: User {
                    id: "user-1".into(),
                    name: Some("Alice".into()),
                    ..Default::default()
                },
                expires_at: None,
            }))
        }

        async fn sign_in_social(&self, _: &SocialRequest) -> Result<SocialRedirect, ClientError> {
            Ok(SocialRedirect::default())
        }

        async fn link_social(&self, _: &SocialRequest) -> Result<SocialRedirect, ClientError> {
            Ok(SocialRedirect::default())
        }

        async fn sign_out(&self) -> Result<(), ClientError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_concurrent_lookups_share_one_request() {
        let client = CountingClient::new(Duration::from_millis(50), false);
        let handle = SessionHandle::new(client.clone());

        let (a, b, c) = tokio::join!(handle.get(), handle.get(), handle.get());
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
        let a = a.unwrap().unwrap();
        assert_eq!(a.user.id, "user-1");
        assert_eq!(b.unwrap().unwrap(), a);
        assert_eq!(c.unwrap().unwrap(), a);
    }

    #[tokio::test]
    async fn test_cached_within_ttl() {
        let client = CountingClient::new(Duration::ZERO, false);
        let handle = SessionHandle::new(client.clone());
        handle.get().await.unwrap();
        handle.get().await.unwrap();
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expired_cache_refetches() {
        let client = CountingClient::new(Duration::ZERO, false);
        let handle = SessionHandle::with_ttl(client.clone(), Duration::ZERO);
        handle.get().await.unwrap();
        handle.get().await.unwrap();
        assert_eq!(client.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failure_clears_in_flight_slot() {
        let client = CountingClient::new(Duration::from_millis(10), true);
        let handle = SessionHandle::new(client.clone());

        let (a, b) = tokio::join!(handle.get(), handle.get());
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
        let err = a.unwrap_err();
        assert!(matches!(err, ConnectError::Session(_)));
        assert_eq!(err.message(), "connection refused");
        assert_eq!(b.unwrap_err(), err);

        // The failed lookup is not reused.
        let _ = handle.get().await;
        assert_eq!(client.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_sign_out_invalidates() {
        let client = CountingClient::new(Duration::ZERO, false);
        let handle = SessionHandle::new(client.clone());
        handle.get().await.unwrap();
        handle.sign_out().await.unwrap();
        handle.get().await.unwrap();
        assert_eq!(client.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_social_request_wire_names() {
        let req = SocialRequest {
            provider: "twitter".into(),
            callback_url: "/app/integrations/x".into(),
            scopes: vec!["tweet.read".into()],
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["callbackURL"], "/app/integrations/x");
        assert_eq!(json["scopes"][0], "tweet.read");

        let bare = SocialRequest { scopes: vec![], ..req };
        assert!(serde_json::to_value(&bare).unwrap().get("scopes").is_none());
    }
}
