#![doc = include_str!("../README.md")]

pub mod identity;
pub mod session;
pub mod store;

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use better_auth_connect_core::devto::{AddApiKeyRequest, AddApiKeyResponse, AddedAccount};
use better_auth_connect_core::options::{DEFAULT_API_BASE_PATH, DEFAULT_DEVTO_IDENTITY_URL};
use better_auth_connect_core::{mask_refresh_token, Account, ConnectOptions, Platform, MASKED_SECRET};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};

pub use identity::{DevToIdentityVerifier, IdentityVerifier, VerifyError};
pub use session::{extract_session_token, MemorySessionResolver, SessionResolver, DEFAULT_COOKIE_PREFIX};
pub use store::{AccountStore, MemoryAccountStore, StoreError};

const DEVTO_PROVIDER_ID: &str = "devto";

// ─── Error Handling ──────────────────────────────────────────────

/// Error body returned by every account route: `{error, details?}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteError {
    status: StatusCode,
    error: String,
    details: Option<String>,
}

impl RouteError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    fn unknown_platform() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Unknown platform")
    }

    fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized")
    }

    fn bad_request(error: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error)
    }

    fn internal(error: &str, cause: impl std::fmt::Display) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, error).with_details(cause.to_string())
    }
}

impl IntoResponse for RouteError {
    fn into_response(self) -> Response {
        let mut body = serde_json::json!({ "error": self.error });
        if let Some(details) = self.details {
            body["details"] = serde_json::Value::String(details);
        }
        (self.status, Json(body)).into_response()
    }
}

// ─── Options ─────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct AccountRoutesOptions {
    /// Prefix the routes are nested under.
    pub base_path: String,
    pub devto_identity_url: String,
    /// User that Dev.to writes are attributed to when the request carries no
    /// session. `None` rejects such writes with 401.
    pub fallback_user_id: Option<String>,
}

impl Default for AccountRoutesOptions {
    fn default() -> Self {
        Self {
            base_path: DEFAULT_API_BASE_PATH.to_string(),
            devto_identity_url: DEFAULT_DEVTO_IDENTITY_URL.to_string(),
            fallback_user_id: None,
        }
    }
}

impl From<&ConnectOptions> for AccountRoutesOptions {
    fn from(options: &ConnectOptions) -> Self {
        Self {
            base_path: options.api_base_path.clone(),
            devto_identity_url: options.devto_identity_url.clone(),
            fallback_user_id: None,
        }
    }
}

struct RouteState {
    store: Arc<dyn AccountStore>,
    sessions: Arc<dyn SessionResolver>,
    verifier: Arc<dyn IdentityVerifier>,
    options: AccountRoutesOptions,
}

// ─── Router Builder ──────────────────────────────────────────────

/// Connected-account endpoints for Axum.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use better_auth_connect_axum::{AccountRoutes, MemoryAccountStore, MemorySessionResolver};
///
/// let routes = AccountRoutes::new(
///     Arc::new(MemoryAccountStore::new()),
///     Arc::new(MemorySessionResolver::new()),
/// );
/// let app = axum::Router::new().merge(routes.router());
/// ```
pub struct AccountRoutes {
    state: Arc<RouteState>,
}

impl AccountRoutes {
    pub fn new(store: Arc<dyn AccountStore>, sessions: Arc<dyn SessionResolver>) -> Self {
        Self::with_options(store, sessions, AccountRoutesOptions::default())
    }

    pub fn with_options(
        store: Arc<dyn AccountStore>,
        sessions: Arc<dyn SessionResolver>,
        options: AccountRoutesOptions,
    ) -> Self {
        let verifier = Arc::new(DevToIdentityVerifier::new(options.devto_identity_url.clone()));
        Self {
            state: Arc::new(RouteState {
                store,
                sessions,
                verifier,
                options,
            }),
        }
    }

    /// Replace the Dev.to identity check.
    pub fn with_verifier(self, verifier: Arc<dyn IdentityVerifier>) -> Self {
        let state = RouteState {
            store: Arc::clone(&self.state.store),
            sessions: Arc::clone(&self.state.sessions),
            verifier,
            options: self.state.options.clone(),
        };
        Self { state: Arc::new(state) }
    }

    pub fn options(&self) -> &AccountRoutesOptions {
        &self.state.options
    }

    /// Routes nested under the configured base path (default `/api/auth`).
    /// An empty or `/` base path mounts them at the root.
    pub fn router(&self) -> Router {
        match normalize_base_path(&self.state.options.base_path) {
            Some(base_path) => Router::new().nest(&base_path, self.account_routes()),
            None => Router::new().merge(self.account_routes()),
        }
    }

    /// Same as [`AccountRoutes::router`] with permissive CORS.
    pub fn router_with_cors(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        self.router().layer(cors)
    }

    fn account_routes(&self) -> Router {
        Router::new()
            .route(
                "/devto/accounts",
                get(handle_list_devto).post(handle_add_devto).delete(handle_delete_devto),
            )
            .route(
                "/{platform}/accounts",
                get(handle_list_platform).delete(handle_delete_platform),
            )
            .with_state(Arc::clone(&self.state))
    }
}

// ─── Helpers ─────────────────────────────────────────────────────

/// `api/auth/` becomes `/api/auth`; root paths become `None`.
fn normalize_base_path(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_matches('/');
    (!trimmed.is_empty()).then(|| format!("/{trimmed}"))
}

/// Accept only the OAuth platforms; Dev.to has its own routes.
fn oauth_platform(raw: &str) -> Result<Platform, RouteError> {
    match raw.parse::<Platform>() {
        Ok(platform) if platform.is_oauth() => Ok(platform),
        _ => Err(RouteError::unknown_platform()),
    }
}

/// Client-safe view of a stored OAuth account.
fn masked_oauth_account(account: Account, info: better_auth_connect_core::TokenInfo) -> Account {
    Account {
        access_token: Some(MASKED_SECRET.to_string()),
        refresh_token: mask_refresh_token(info.has_refresh_token),
        access_token_expires_at: info.access_token_expires_at,
        is_expired: Some(info.is_expired),
        api_key: None,
        ..account
    }
}

/// Client-safe view of a stored Dev.to account.
fn masked_devto_account(account: Account) -> Account {
    Account {
        access_token: None,
        refresh_token: None,
        api_key: Some(MASKED_SECRET.to_string()),
        ..account
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountIdQuery {
    account_id: Option<String>,
}

impl AccountIdQuery {
    fn require(self) -> Result<String, RouteError> {
        self.account_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| RouteError::bad_request("accountId is required"))
    }
}

async fn write_user(state: &RouteState, headers: &HeaderMap) -> Result<String, RouteError> {
    match state.sessions.user_id(headers).await {
        Some(user_id) => Ok(user_id),
        None => state.options.fallback_user_id.clone().ok_or_else(RouteError::unauthorized),
    }
}

// ─── OAuth Platform Handlers ─────────────────────────────────────

/// `GET /{platform}/accounts`
async fn handle_list_platform(
    State(state): State<Arc<RouteState>>,
    Path(platform): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Vec<Account>>, RouteError> {
    let platform = oauth_platform(&platform)?;
    let user_id = state.sessions.user_id(&headers).await.ok_or_else(RouteError::unauthorized)?;

    let result = async {
        let rows = state.store.list_accounts(Some(&user_id), platform.provider_id()).await?;
        let mut accounts = Vec::with_capacity(rows.len());
        for row in rows {
            let info = state.store.token_info(&row.id).await?;
            accounts.push(masked_oauth_account(row, info));
        }
        Ok::<_, StoreError>(accounts)
    }
    .await;

    match result {
        Ok(accounts) => Ok(Json(accounts)),
        Err(e) => {
            tracing::error!("Failed to list {} accounts: {}", platform, e);
            Err(RouteError::internal("Failed to fetch accounts", e))
        }
    }
}

/// `DELETE /{platform}/accounts?accountId=`
async fn handle_delete_platform(
    State(state): State<Arc<RouteState>>,
    Path(platform): Path<String>,
    Query(query): Query<AccountIdQuery>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, RouteError> {
    let platform = oauth_platform(&platform)?;
    let user_id = state.sessions.user_id(&headers).await.ok_or_else(RouteError::unauthorized)?;
    let account_id = query.require()?;

    match state.store.delete_account(&account_id, &user_id, platform.provider_id()).await {
        Ok(removed) => {
            tracing::info!("Disconnected {} account {} (removed: {})", platform, account_id, removed);
            Ok(Json(serde_json::json!({ "success": true })))
        }
        Err(e) => {
            tracing::error!("Failed to disconnect {} account {}: {}", platform, account_id, e);
            Err(RouteError::internal("Failed to disconnect account", e))
        }
    }
}

// ─── Dev.to Handlers ─────────────────────────────────────────────

/// `GET /devto/accounts`. Without a session every Dev.to account is listed.
async fn handle_list_devto(
    State(state): State<Arc<RouteState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Account>>, RouteError> {
    let user_id = state.sessions.user_id(&headers).await;

    let rows = state
        .store
        .list_accounts(user_id.as_deref(), DEVTO_PROVIDER_ID)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list Dev.to accounts: {}", e);
            RouteError::internal("Failed to fetch accounts", e)
        })?;

    Ok(Json(rows.into_iter().map(masked_devto_account).collect()))
}

/// `POST /devto/accounts` with `{"apiKey": "..."}`
async fn handle_add_devto(
    State(state): State<Arc<RouteState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<AddApiKeyResponse>, RouteError> {
    let user_id = write_user(&state, &headers).await?;

    let api_key = serde_json::from_slice::<AddApiKeyRequest>(&body)
        .ok()
        .and_then(|req| req.api_key)
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .ok_or_else(|| RouteError::bad_request("API key is required"))?;

    let profile = match state.verifier.verify(&api_key).await {
        Ok(Some(profile)) => profile,
        Ok(None) => return Err(RouteError::bad_request("Invalid API key")),
        Err(e) => {
            tracing::error!("Dev.to identity check failed: {}", e);
            return Err(RouteError::internal("Failed to connect account", e));
        }
    };

    let mut account = Account::new(
        nanoid::nanoid!(),
        user_id,
        DEVTO_PROVIDER_ID,
        profile.account_id(),
    );
    account.access_token = Some(api_key);
    account.username = Some(profile.username.clone());
    account.name = Some(profile.name.clone()).filter(|n| !n.is_empty());
    account.profile_image_url = profile.profile_image.clone();

    let stored = state.store.upsert_account(account).await.map_err(|e| {
        tracing::error!("Failed to store Dev.to account {}: {}", profile.account_id(), e);
        RouteError::internal("Failed to connect account", e)
    })?;

    tracing::info!("Connected Dev.to account {} as {}", profile.username, stored.id);
    Ok(Json(AddApiKeyResponse {
        success: true,
        account: AddedAccount {
            id: stored.id,
            username: profile.username,
            profile_image_url: profile.profile_image,
        },
    }))
}

/// `DELETE /devto/accounts?accountId=`
async fn handle_delete_devto(
    State(state): State<Arc<RouteState>>,
    Query(query): Query<AccountIdQuery>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, RouteError> {
    let user_id = write_user(&state, &headers).await?;
    let account_id = query.require()?;

    state
        .store
        .delete_account(&account_id, &user_id, DEVTO_PROVIDER_ID)
        .await
        .map_err(|e| {
            tracing::error!("Failed to remove Dev.to account {}: {}", account_id, e);
            RouteError::internal("Failed to disconnect account", e)
        })?;

    Ok(Json(serde_json::json!({ "success": true })))
}
