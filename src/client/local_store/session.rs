//! Session token and cached account

use super::{keys, LocalStore, StoreError};
use crate::shared::api_types::UserAccount;
use tracing::debug;

/// Typed access to the session-related keys of the local store
#[derive(Debug, Clone)]
pub struct SessionStore {
    store: LocalStore,
}

impl SessionStore {
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }

    pub async fn token(&self) -> Result<Option<String>, StoreError> {
        Ok(self
            .store
            .get::<String>(keys::SESSION_TOKEN)
            .await?
            .map(|stored| stored.value)
            .filter(|token| !token.is_empty()))
    }

    pub async fn set_token(&self, token: &str) -> Result<(), StoreError> {
        self.store.put(keys::SESSION_TOKEN, &token).await?;
        Ok(())
    }

    pub async fn account(&self) -> Result<Option<UserAccount>, StoreError> {
        Ok(self
            .store
            .get::<UserAccount>(keys::ACCOUNT_SNAPSHOT)
            .await?
            .map(|stored| stored.value))
    }

    pub async fn set_account(&self, account: &UserAccount) -> Result<(), StoreError> {
        self.store.put(keys::ACCOUNT_SNAPSHOT, account).await?;
        Ok(())
    }

    /// Apply server-confirmed totals to the cached account, if any
    pub async fn update_account_progress(&self, xp: u64, level: u32) -> Result<(), StoreError> {
        if let Some(mut account) = self.account().await? {
            account.xp = xp;
            account.level = level;
            self.set_account(&account).await?;
        }
        Ok(())
    }

    /// Forget the token and the cached account (logout or rejected token)
    pub async fn clear(&self) -> Result<(), StoreError> {
        debug!("Clearing stored session");
        self.store.remove(keys::SESSION_TOKEN).await?;
        self.store.remove(keys::ACCOUNT_SNAPSHOT).await?;
        Ok(())
    }
}
