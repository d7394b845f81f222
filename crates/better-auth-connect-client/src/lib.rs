//! # better-auth-connect client
//!
//! Headless services for connecting third-party accounts (Reddit, X, Dev.to,
//! Google) to a better-auth user. OAuth platforms hand the provider
//! handshake to better-auth and return a [`ConnectIntent`] for the host to
//! follow; Dev.to stores a validated API key. Account lists are cached per
//! platform and fall back to an empty list when the backend is unreachable.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use better_auth_connect_client::Integrations;
//! use better_auth_connect_core::{ConnectOptions, Platform};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     better_auth_connect_core::env::init_logger();
//!     let integrations = Integrations::new(ConnectOptions::new("https://my-app.com"));
//!
//!     let reddit = integrations.integration(Platform::Reddit);
//!     reddit.load().await;
//!     if !reddit.connected() {
//!         let intent = reddit.connect(None).await?;
//!         println!("Continue at {:?}", intent.redirect_url);
//!     }
//!
//!     let accounts = integrations.devto().get_accounts(false).await;
//!     println!("{} Dev.to accounts", accounts.len());
//!     Ok(())
//! }
//! ```

mod error;
pub mod http;
pub mod integration;
pub mod registry;
pub mod service;
pub mod session;
pub mod view;

pub use error::*;
pub use http::{ApiClient, BetterAuthSessionClient};
pub use integration::{
    AccountsView, ConnectionEvent, ConnectionState, ErrorCallback, Integration, IntegrationState,
    InvalidTransition, SessionState, SessionView,
};
pub use registry::{cache_from_options, Integrations};
pub use service::{ApiKeyService, ConnectIntent, ConnectMode, OAuthService, PlatformService};
pub use session::{Session, SessionClient, SessionHandle, SocialRedirect, SocialRequest, User};
pub use view::{AccountSummary, ApiKeyInput, StatusBadge};
