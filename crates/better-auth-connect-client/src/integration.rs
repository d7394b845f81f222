//! Observable integration state for UI layers.
//!
//! Each view keeps its state in a `tokio::sync::watch` channel: callers
//! drive it with async methods and render from [`Integration::subscribe`]
//! or a snapshot.

use std::fmt;
use std::sync::Arc;

use better_auth_connect_core::devto::AddedAccount;
use better_auth_connect_core::expiry::{self, DEFAULT_EXPIRY_WARNING_HOURS};
use better_auth_connect_core::{Account, ConnectError, Platform};
use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::service::{ConnectIntent, PlatformService};
use crate::session::{Session, SessionClient};

/// Called with every error an [`Integration`] records.
pub type ErrorCallback = Arc<dyn Fn(&ConnectError) + Send + Sync>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntegrationState {
    pub accounts: Vec<Account>,
    pub loading: bool,
    pub error: Option<ConnectError>,
}

impl IntegrationState {
    pub fn connected(&self) -> bool {
        !self.accounts.is_empty()
    }
}

/// Connection state for one platform: its accounts plus connect and
/// disconnect actions.
#[derive(Clone)]
pub struct Integration {
    service: PlatformService,
    state: Arc<watch::Sender<IntegrationState>>,
    on_error: Option<ErrorCallback>,
}

impl fmt::Debug for Integration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Integration")
            .field("platform", &self.platform())
            .field("state", &*self.state.borrow())
            .finish()
    }
}

impl Integration {
    pub fn new(service: PlatformService, on_error: Option<ErrorCallback>) -> Self {
        let (state, _) = watch::channel(IntegrationState::default());
        Self {
            service,
            state: Arc::new(state),
            on_error,
        }
    }

    pub fn platform(&self) -> Platform {
        self.service.platform()
    }

    pub fn state(&self) -> IntegrationState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<IntegrationState> {
        self.state.subscribe()
    }

    pub fn connected(&self) -> bool {
        self.state.borrow().connected()
    }

    fn begin(&self) {
        self.state.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });
    }

    fn fail(&self, err: &ConnectError) {
        self.state.send_modify(|s| {
            s.loading = false;
            s.error = Some(err.clone());
        });
        if let Some(callback) = &self.on_error {
            callback(err);
        }
    }

    async fn fetch(&self, force_refresh: bool) {
        self.begin();
        let accounts = self.service.get_accounts(force_refresh).await;
        self.state.send_modify(|s| {
            s.accounts = accounts;
            s.loading = false;
        });
    }

    /// Load accounts, accepting the cache.
    pub async fn load(&self) {
        self.fetch(false).await;
    }

    /// Reload accounts from the backend.
    pub async fn refresh(&self) {
        self.fetch(true).await;
    }

    /// Start the OAuth handshake. `None` scopes means the platform defaults.
    ///
    /// API-key platforms cannot be connected this way; use
    /// [`Integration::connect_api_key`].
    pub async fn connect(&self, scopes: Option<Vec<String>>) -> Result<ConnectIntent, ConnectError> {
        self.begin();
        let result = match &self.service {
            PlatformService::OAuth(service) => service.connect(scopes).await,
            PlatformService::ApiKey(service) => Err(ConnectError::connection(
                service.platform(),
                Some(format!(
                    "{} requires API key. Use the ApiKeyInput component.",
                    service.platform().name()
                )),
            )),
        };
        match result {
            Ok(intent) => {
                self.state.send_modify(|s| s.loading = false);
                Ok(intent)
            }
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    /// Store an API key, then reload accounts.
    pub async fn connect_api_key(&self, api_key: &str) -> Result<AddedAccount, ConnectError> {
        self.begin();
        let result = match &self.service {
            PlatformService::ApiKey(service) => service.add_account(api_key).await,
            PlatformService::OAuth(service) => Err(ConnectError::connection(
                service.platform(),
                Some(format!("{} does not use API keys", service.platform().name())),
            )),
        };
        match result {
            Ok(account) => {
                self.refresh().await;
                Ok(account)
            }
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    /// Remove an account, then reload accounts from the backend.
    pub async fn disconnect(&self, account_id: &str) -> Result<(), ConnectError> {
        self.begin();
        match self.service.disconnect(account_id).await {
            Ok(()) => {
                self.refresh().await;
                Ok(())
            }
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }
}

/// Read-only account list for one platform.
#[derive(Debug, Clone)]
pub struct AccountsView {
    service: PlatformService,
    state: Arc<watch::Sender<IntegrationState>>,
}

impl AccountsView {
    pub fn new(service: PlatformService) -> Self {
        let (state, _) = watch::channel(IntegrationState::default());
        Self {
            service,
            state: Arc::new(state),
        }
    }

    pub fn state(&self) -> IntegrationState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<IntegrationState> {
        self.state.subscribe()
    }

    pub async fn load(&self, force_refresh: bool) {
        self.state.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });
        let accounts = self.service.get_accounts(force_refresh).await;
        self.state.send_modify(|s| {
            s.accounts = accounts;
            s.loading = false;
        });
    }

    pub async fn refresh(&self) {
        self.load(true).await;
    }

    pub fn is_expired(&self, account: &Account) -> bool {
        expiry::is_expired(account)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub session: Option<Session>,
    pub loading: bool,
    pub error: Option<ConnectError>,
}

/// The signed-in user, fetched straight from the session client.
#[derive(Clone)]
pub struct SessionView {
    client: Arc<dyn SessionClient>,
    state: Arc<watch::Sender<SessionState>>,
}

impl fmt::Debug for SessionView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionView").field("state", &*self.state.borrow()).finish()
    }
}

impl SessionView {
    pub fn new(client: Arc<dyn SessionClient>) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            client,
            state: Arc::new(state),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub async fn load(&self) {
        self.state.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });
        let result = self.client.get_session().await;
        self.state.send_modify(|s| {
            s.loading = false;
            match result {
                Ok(session) => s.session = session,
                Err(e) => {
                    s.session = None;
                    s.error = Some(ConnectError::session(Some(e.message().to_string())));
                }
            }
        });
    }
}

/// Lifecycle of a single connected account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Expiring,
    Expired,
    Reconnecting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionEvent {
    /// The user started a connect.
    Connect,
    /// The provider handshake completed.
    Established,
    /// The handshake failed or was abandoned.
    Failed,
    /// The token entered the expiry warning window.
    TokenExpiring,
    /// The token expired.
    TokenExpired,
    /// The user started a reconnect.
    Reconnect,
    /// The account was removed.
    Remove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Invalid transition: {event:?} in state {from:?}")]
pub struct InvalidTransition {
    pub from: ConnectionState,
    pub event: ConnectionEvent,
}

impl ConnectionState {
    pub fn apply(self, event: ConnectionEvent) -> Result<ConnectionState, InvalidTransition> {
        use ConnectionEvent as E;
        use ConnectionState as S;

        let next = match (self, event) {
            (S::Disconnected, E::Connect) => S::Connecting,
            (S::Connecting, E::Established) => S::Connected,
            (S::Connecting, E::Failed) => S::Disconnected,
            (S::Connected, E::TokenExpiring) => S::Expiring,
            (S::Connected | S::Expiring, E::TokenExpired) => S::Expired,
            (S::Connected | S::Expiring | S::Expired, E::Reconnect) => S::Reconnecting,
            (S::Reconnecting, E::Established) => S::Connected,
            (S::Reconnecting, E::Failed) => S::Expired,
            (from, E::Remove) if from != S::Disconnected => S::Disconnected,
            (from, event) => return Err(InvalidTransition { from, event }),
        };
        Ok(next)
    }

    /// The state implied by an account's token: `None` is disconnected.
    pub fn observe(account: Option<&Account>, now: DateTime<Utc>) -> ConnectionState {
        let Some(account) = account else {
            return ConnectionState::Disconnected;
        };
        if expiry::is_expired_at(account, now) {
            ConnectionState::Expired
        } else if expiry::is_expiring_soon_at(account, DEFAULT_EXPIRY_WARNING_HOURS, now) {
            ConnectionState::Expiring
        } else {
            ConnectionState::Connected
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use ConnectionEvent as E;
    use ConnectionState as S;

    #[test]
    fn test_happy_path() {
        let state = S::Disconnected.apply(E::Connect).unwrap();
        assert_eq!(state, S::Connecting);
        let state = state.apply(E::Established).unwrap();
        assert_eq!(state, S::Connected);
        let state = state.apply(E::TokenExpiring).unwrap();
        assert_eq!(state, S::Expiring);
        let state = state.apply(E::TokenExpired).unwrap();
        assert_eq!(state, S::Expired);
        let state = state.apply(E::Reconnect).unwrap();
        assert_eq!(state, S::Reconnecting);
        assert_eq!(state.apply(E::Established).unwrap(), S::Connected);
    }

    #[test]
    fn test_expired_is_not_terminal() {
        assert_eq!(S::Expired.apply(E::Reconnect).unwrap(), S::Reconnecting);
        assert_eq!(S::Expired.apply(E::Remove).unwrap(), S::Disconnected);
        assert_eq!(S::Reconnecting.apply(E::Failed).unwrap(), S::Expired);
    }

    #[test]
    fn test_remove_from_any_connected_state() {
        for from in [S::Connecting, S::Connected, S::Expiring, S::Expired, S::Reconnecting] {
            assert_eq!(from.apply(E::Remove).unwrap(), S::Disconnected);
        }
    }

    #[test]
    fn test_invalid_transitions() {
        let err = S::Disconnected.apply(E::Established).unwrap_err();
        assert_eq!(err.from, S::Disconnected);
        assert_eq!(err.event, E::Established);
        assert!(S::Disconnected.apply(E::Remove).is_err());
        assert!(S::Connected.apply(E::Connect).is_err());
    }

    #[test]
    fn test_observe() {
        let now = Utc::now();
        let base = Account::new("a", "u", "reddit", "r");
        assert_eq!(S::observe(None, now), S::Disconnected);
        assert_eq!(S::observe(Some(&base), now), S::Connected);
        let soon = base.clone().with_expiry(now + Duration::hours(2));
        assert_eq!(S::observe(Some(&soon), now), S::Expiring);
        let gone = base.with_expiry(now - Duration::seconds(1));
        assert_eq!(S::observe(Some(&gone), now), S::Expired);
    }

    #[test]
    fn test_connected_derivation() {
        let mut state = IntegrationState::default();
        assert!(!state.connected());
        state.accounts.push(Account::new("a", "u", "google", "g"));
        assert!(state.connected());
    }
}
