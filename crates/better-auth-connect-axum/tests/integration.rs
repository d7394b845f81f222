// Integration tests for better-auth-connect-axum
//
// HTTP-level tests using tower::ServiceExt::oneshot to exercise the full
// Axum router without starting a real TCP server.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use tower::ServiceExt;

use better_auth_connect_axum::{
    AccountRoutes, AccountRoutesOptions, AccountStore, IdentityVerifier, MemoryAccountStore,
    MemorySessionResolver, StoreError, VerifyError,
};
use better_auth_connect_core::{Account, DevToProfile};

// ─── Test Doubles ─────────────────────────────────────────────────

/// Accepts `good-key` (profile 42, "ben") and `key-{n}` (profile n).
struct StubVerifier;

#[async_trait::async_trait]
impl IdentityVerifier for StubVerifier {
    async fn verify(&self, api_key: &str) -> Result<Option<DevToProfile>, VerifyError> {
        if api_key == "good-key" {
            return Ok(Some(DevToProfile {
                id: 42,
                username: "ben".into(),
                name: "Ben".into(),
                summary: None,
                profile_image: Some("https://img.example.com/ben.png".into()),
                joined_at: None,
            }));
        }
        let Some(id) = api_key.strip_prefix("key-").and_then(|n| n.parse::<i64>().ok()) else {
            return Ok(None);
        };
        Ok(Some(DevToProfile {
            id,
            username: format!("writer{id}"),
            name: String::new(),
            summary: None,
            profile_image: None,
            joined_at: None,
        }))
    }
}

/// Every call fails.
#[derive(Debug)]
struct BrokenStore;

#[async_trait::async_trait]
impl AccountStore for BrokenStore {
    async fn list_accounts(&self, _: Option<&str>, _: &str) -> Result<Vec<Account>, StoreError> {
        Err(StoreError::Backend("connection refused".into()))
    }
    async fn find_account(&self, _: &str) -> Result<Option<Account>, StoreError> {
        Err(StoreError::Backend("connection refused".into()))
    }
    async fn find_by_provider_account(&self, _: &str, _: &str) -> Result<Option<Account>, StoreError> {
        Err(StoreError::Backend("connection refused".into()))
    }
    async fn upsert_account(&self, _: Account) -> Result<Account, StoreError> {
        Err(StoreError::Backend("connection refused".into()))
    }
    async fn delete_account(&self, _: &str, _: &str, _: &str) -> Result<bool, StoreError> {
        Err(StoreError::Backend("connection refused".into()))
    }
}

const COOKIE: &str = "better-auth.session_token=tok-1";

async fn build_app(store: Arc<dyn AccountStore>) -> axum::Router {
    let sessions = MemorySessionResolver::new();
    sessions.insert("tok-1", "user-1").await;
    AccountRoutes::new(store, Arc::new(sessions))
        .with_verifier(Arc::new(StubVerifier))
        .router()
}

fn seeded_store() -> MemoryAccountStore {
    let mut reddit = Account::new("acc-r1", "user-1", "reddit", "r-1").with_expiry(Utc::now() + Duration::hours(2));
    reddit.access_token = Some("reddit-secret".into());
    reddit.refresh_token = Some("reddit-refresh".into());
    reddit.scope = Some("identity read".into());

    let mut twitter = Account::new("acc-x1", "user-1", "twitter", "x-1").with_expiry(Utc::now() - Duration::hours(1));
    twitter.access_token = Some("x-secret".into());

    let other_user = Account::new("acc-r2", "user-2", "reddit", "r-2");

    let mut devto = Account::new("acc-d1", "user-1", "devto", "devto-7");
    devto.access_token = Some("devto-secret".into());

    MemoryAccountStore::with_accounts([reddit, twitter, other_user, devto])
}

/// Helper to read a response body into a JSON value.
async fn body_json(body: Body) -> serde_json::Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ─── OAuth Platform Routes ────────────────────────────────────────

#[tokio::test]
async fn list_unknown_platform_returns_404() {
    let app = build_app(Arc::new(seeded_store())).await;

    let request = Request::get("/api/auth/myspace/accounts")
        .header("cookie", COOKIE)
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response.into_body()).await;
    assert_eq!(json, serde_json::json!({"error": "Unknown platform"}));
}

#[tokio::test]
async fn list_without_session_returns_401() {
    let app = build_app(Arc::new(seeded_store())).await;

    let request = Request::get("/api/auth/reddit/accounts").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response.into_body()).await;
    assert_eq!(json["error"], "Unauthorized");
}

#[tokio::test]
async fn list_returns_masked_accounts_for_user() {
    let app = build_app(Arc::new(seeded_store())).await;

    let request = Request::get("/api/auth/reddit/accounts")
        .header("cookie", COOKIE)
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response.into_body()).await;
    let accounts = json.as_array().expect("response should be an array");
    assert_eq!(accounts.len(), 1, "only user-1's reddit account should be listed");

    let account = &accounts[0];
    assert_eq!(account["id"], "acc-r1");
    assert_eq!(account["accessToken"], "hidden");
    assert_eq!(account["refreshToken"], "present");
    assert_eq!(account["isExpired"], false);
    assert_eq!(account["scope"], "identity read");
    assert!(account["accessTokenExpiresAt"].is_string());
    assert!(!json.to_string().contains("reddit-secret"));
}

#[tokio::test]
async fn list_x_maps_to_twitter_provider() {
    let app = build_app(Arc::new(seeded_store())).await;

    let request = Request::get("/api/auth/x/accounts")
        .header("authorization", "Bearer tok-1")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response.into_body()).await;
    assert_eq!(json[0]["providerId"], "twitter");
    assert_eq!(json[0]["isExpired"], true);
    assert!(json[0]["refreshToken"].is_null());
}

#[tokio::test]
async fn list_store_failure_returns_500_with_details() {
    let app = build_app(Arc::new(BrokenStore)).await;

    let request = Request::get("/api/auth/google/accounts")
        .header("cookie", COOKIE)
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response.into_body()).await;
    assert_eq!(json["error"], "Failed to fetch accounts");
    assert!(json["details"].as_str().unwrap().contains("connection refused"));
}

#[tokio::test]
async fn delete_requires_account_id() {
    let app = build_app(Arc::new(seeded_store())).await;

    let request = Request::delete("/api/auth/reddit/accounts")
        .header("cookie", COOKIE)
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response.into_body()).await;
    assert_eq!(json["error"], "accountId is required");
}

#[tokio::test]
async fn delete_without_session_returns_401() {
    let app = build_app(Arc::new(seeded_store())).await;

    let request = Request::delete("/api/auth/reddit/accounts?accountId=acc-r1")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn delete_removes_owned_account() {
    let store = seeded_store();
    let app = build_app(Arc::new(store.clone())).await;

    let request = Request::delete("/api/auth/reddit/accounts?accountId=acc-r1")
        .header("cookie", COOKIE)
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response.into_body()).await;
    assert_eq!(json, serde_json::json!({"success": true}));
    assert!(store.find_account("acc-r1").await.unwrap().is_none());
    assert!(store.find_account("acc-r2").await.unwrap().is_some());
}

#[tokio::test]
async fn delete_store_failure_returns_500() {
    let app = build_app(Arc::new(BrokenStore)).await;

    let request = Request::delete("/api/auth/google/accounts?accountId=acc-g1")
        .header("cookie", COOKIE)
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response.into_body()).await;
    assert_eq!(json["error"], "Failed to disconnect account");
    assert!(json.get("details").is_some());
}

// ─── Dev.to Routes ────────────────────────────────────────────────

#[tokio::test]
async fn devto_list_masks_api_key() {
    let app = build_app(Arc::new(seeded_store())).await;

    let request = Request::get("/api/auth/devto/accounts")
        .header("cookie", COOKIE)
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response.into_body()).await;
    assert_eq!(json[0]["accountId"], "devto-7");
    assert_eq!(json[0]["apiKey"], "hidden");
    assert!(!json.to_string().contains("devto-secret"));
}

#[tokio::test]
async fn devto_list_without_session_is_allowed() {
    let app = build_app(Arc::new(seeded_store())).await;

    let request = Request::get("/api/auth/devto/accounts").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response.into_body()).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn devto_add_requires_api_key() {
    let app = build_app(Arc::new(seeded_store())).await;

    let request = Request::post("/api/auth/devto/accounts")
        .header("cookie", COOKIE)
        .header("content-type", "application/json")
        .body(Body::from(r#"{"apiKey": "   "}"#))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response.into_body()).await;
    assert_eq!(json["error"], "API key is required");
}

#[tokio::test]
async fn devto_add_rejects_invalid_key() {
    let store = MemoryAccountStore::new();
    let app = build_app(Arc::new(store.clone())).await;

    let request = Request::post("/api/auth/devto/accounts")
        .header("cookie", COOKIE)
        .header("content-type", "application/json")
        .body(Body::from(r#"{"apiKey": "bad-key"}"#))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response.into_body()).await;
    assert_eq!(json["error"], "Invalid API key");
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn devto_add_upserts_by_profile_id() {
    let store = MemoryAccountStore::new();
    let app = build_app(Arc::new(store.clone())).await;

    let add = || {
        Request::post("/api/auth/devto/accounts")
            .header("cookie", COOKIE)
            .header("content-type", "application/json")
            .body(Body::from(r#"{"apiKey": "good-key"}"#))
            .unwrap()
    };

    let response = app.clone().oneshot(add()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let first = body_json(response.into_body()).await;
    assert_eq!(first["success"], true);
    assert_eq!(first["account"]["username"], "ben");
    assert_eq!(first["account"]["profileImageUrl"], "https://img.example.com/ben.png");

    let response = app.oneshot(add()).await.unwrap();
    let second = body_json(response.into_body()).await;
    assert_eq!(second["account"]["id"], first["account"]["id"]);

    assert_eq!(store.len().await, 1);
    let stored = store.find_by_provider_account("devto", "devto-42").await.unwrap().unwrap();
    assert_eq!(stored.user_id, "user-1");
    assert_eq!(stored.access_token.as_deref(), Some("good-key"));
}

fn add_devto_request(api_key: &str) -> Request<Body> {
    Request::post("/api/auth/devto/accounts")
        .header("cookie", COOKIE)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::json!({ "apiKey": api_key }).to_string()))
        .unwrap()
}

#[tokio::test]
async fn devto_add_distinct_profiles_get_distinct_rows() {
    let store = MemoryAccountStore::new();
    let app = build_app(Arc::new(store.clone())).await;

    let response = app.clone().oneshot(add_devto_request("key-1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let first = body_json(response.into_body()).await;

    let response = app.oneshot(add_devto_request("key-2")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let second = body_json(response.into_body()).await;

    assert_ne!(first["account"]["id"], second["account"]["id"]);
    assert_eq!(store.len().await, 2);
    assert!(store.find_by_provider_account("devto", "devto-1").await.unwrap().is_some());
    assert!(store.find_by_provider_account("devto", "devto-2").await.unwrap().is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn devto_add_concurrent_profiles_are_all_stored() {
    let store = MemoryAccountStore::new();
    let app = build_app(Arc::new(store.clone())).await;

    let requests: Vec<_> = (0..50)
        .map(|i| {
            let app = app.clone();
            tokio::spawn(async move { app.oneshot(add_devto_request(&format!("key-{i}"))).await.unwrap() })
        })
        .collect();
    for request in requests {
        assert_eq!(request.await.unwrap().status(), StatusCode::OK);
    }

    assert_eq!(store.len().await, 50);
}

#[tokio::test]
async fn devto_add_without_session_needs_fallback_user() {
    let store = MemoryAccountStore::new();
    let request = || {
        Request::post("/api/auth/devto/accounts")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"apiKey": "good-key"}"#))
            .unwrap()
    };

    let app = build_app(Arc::new(store.clone())).await;
    let response = app.oneshot(request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let options = AccountRoutesOptions {
        fallback_user_id: Some("default-user-id".into()),
        ..Default::default()
    };
    let app = AccountRoutes::with_options(Arc::new(store.clone()), Arc::new(MemorySessionResolver::new()), options)
        .with_verifier(Arc::new(StubVerifier))
        .router();
    let response = app.oneshot(request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let stored = store.find_by_provider_account("devto", "devto-42").await.unwrap().unwrap();
    assert_eq!(stored.user_id, "default-user-id");
}

#[tokio::test]
async fn devto_delete_removes_account() {
    let store = seeded_store();
    let app = build_app(Arc::new(store.clone())).await;

    let request = Request::delete("/api/auth/devto/accounts?accountId=acc-d1")
        .header("cookie", COOKIE)
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(store.find_account("acc-d1").await.unwrap().is_none());
}

#[tokio::test]
async fn custom_base_path() {
    let options = AccountRoutesOptions {
        base_path: "/auth".into(),
        ..Default::default()
    };
    let sessions = MemorySessionResolver::new();
    sessions.insert("tok-1", "user-1").await;
    let app = AccountRoutes::with_options(Arc::new(seeded_store()), Arc::new(sessions), options).router_with_cors();

    let request = Request::get("/auth/google/accounts")
        .header("cookie", COOKIE)
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response.into_body()).await;
    assert_eq!(json, serde_json::json!([]));
}

#[tokio::test]
async fn root_base_path_mounts_routes_at_root() {
    for base_path in ["", "/"] {
        let options = AccountRoutesOptions {
            base_path: base_path.into(),
            ..Default::default()
        };
        let sessions = MemorySessionResolver::new();
        sessions.insert("tok-1", "user-1").await;
        let app = AccountRoutes::with_options(Arc::new(seeded_store()), Arc::new(sessions), options).router();

        let request = Request::get("/reddit/accounts")
            .header("cookie", COOKIE)
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK, "base path {base_path:?}");
        let json = body_json(response.into_body()).await;
        assert_eq!(json[0]["id"], "acc-r1");
    }
}
