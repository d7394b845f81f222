// Account persistence seam for the connected-account routes.
//
// Records are full `Account`s including raw tokens; the routes mask secrets
// before anything leaves the server.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use better_auth_connect_core::expiry;
use better_auth_connect_core::{Account, TokenInfo};
use chrono::Utc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Account store error: {0}")]
    Backend(String),
    #[error("Account id {0} is already taken")]
    Conflict(String),
}

/// Storage for provider accounts.
#[async_trait]
pub trait AccountStore: Send + Sync + std::fmt::Debug {
    /// Accounts for `provider_id`, restricted to `user_id` when given.
    async fn list_accounts(&self, user_id: Option<&str>, provider_id: &str) -> Result<Vec<Account>, StoreError>;

    async fn find_account(&self, id: &str) -> Result<Option<Account>, StoreError>;

    async fn find_by_provider_account(
        &self,
        provider_id: &str,
        account_id: &str,
    ) -> Result<Option<Account>, StoreError>;

    /// Insert `account`, or refresh the token of the row with the same
    /// provider and provider account id. Returns the stored row. Fails with
    /// [`StoreError::Conflict`] if the row id is held by another account.
    async fn upsert_account(&self, account: Account) -> Result<Account, StoreError>;

    /// Delete the row `id` if it belongs to `user_id` and `provider_id`.
    /// Returns whether a row was removed.
    async fn delete_account(&self, id: &str, user_id: &str, provider_id: &str) -> Result<bool, StoreError>;

    /// Expiry metadata for the row `id`. A missing row reports an expired
    /// token with no refresh token.
    async fn token_info(&self, id: &str) -> Result<TokenInfo, StoreError> {
        let info = match self.find_account(id).await? {
            Some(account) => TokenInfo {
                access_token_expires_at: account.access_token_expires_at,
                is_expired: expiry::is_expired_at(&account, Utc::now()),
                has_refresh_token: account.has_refresh_token(),
            },
            None => TokenInfo {
                access_token_expires_at: None,
                is_expired: true,
                has_refresh_token: false,
            },
        };
        Ok(info)
    }
}

/// In-memory account store keyed by row id. Data is lost when dropped.
#[derive(Debug, Clone, Default)]
pub struct MemoryAccountStore {
    accounts: Arc<RwLock<HashMap<String, Account>>>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `accounts`.
    pub fn with_accounts(accounts: impl IntoIterator<Item = Account>) -> Self {
        let map = accounts.into_iter().map(|a| (a.id.clone(), a)).collect();
        Self {
            accounts: Arc::new(RwLock::new(map)),
        }
    }

    pub async fn len(&self) -> usize {
        self.accounts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.accounts.read().await.is_empty()
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn list_accounts(&self, user_id: Option<&str>, provider_id: &str) -> Result<Vec<Account>, StoreError> {
        let accounts = self.accounts.read().await;
        let mut rows: Vec<Account> = accounts
            .values()
            .filter(|a| a.provider_id == provider_id)
            .filter(|a| user_id.map_or(true, |u| a.user_id == u))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn find_account(&self, id: &str) -> Result<Option<Account>, StoreError> {
        Ok(self.accounts.read().await.get(id).cloned())
    }

    async fn find_by_provider_account(
        &self,
        provider_id: &str,
        account_id: &str,
    ) -> Result<Option<Account>, StoreError> {
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .find(|a| a.provider_id == provider_id && a.account_id == account_id)
            .cloned())
    }

    async fn upsert_account(&self, account: Account) -> Result<Account, StoreError> {
        let mut accounts = self.accounts.write().await;
        let now = Utc::now();

        let existing = accounts
            .values_mut()
            .find(|a| a.provider_id == account.provider_id && a.account_id == account.account_id);

        if let Some(row) = existing {
            row.access_token = account.access_token;
            row.username = account.username.or(row.username.take());
            row.profile_image_url = account.profile_image_url.or(row.profile_image_url.take());
            row.updated_at = Some(now);
            return Ok(row.clone());
        }

        if accounts.contains_key(&account.id) {
            return Err(StoreError::Conflict(account.id));
        }

        let mut row = account;
        row.created_at.get_or_insert(now);
        row.updated_at = Some(now);
        accounts.insert(row.id.clone(), row.clone());
        Ok(row)
    }

    async fn delete_account(&self, id: &str, user_id: &str, provider_id: &str) -> Result<bool, StoreError> {
        let mut accounts = self.accounts.write().await;
        let owned = accounts
            .get(id)
            .is_some_and(|a| a.user_id == user_id && a.provider_id == provider_id);
        if owned {
            accounts.remove(id);
        }
        Ok(owned)
    }
}
