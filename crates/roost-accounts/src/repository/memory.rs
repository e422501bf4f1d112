use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use roost_types::models::{Account, AccountFollow, AccountId, VerifyToken};
use tokio::sync::RwLock;

use super::{AccountRepository, FollowRepository, VerifyTokenRepository};
use crate::error::{AccountError, Result};

#[derive(Default)]
struct AccountTables {
    by_id: HashMap<AccountId, Account>,
    by_name: HashMap<String, AccountId>,
}

/// Process-local account store. Every write happens under one write guard.
#[derive(Default)]
pub struct InMemoryAccountRepository {
    tables: RwLock<AccountTables>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn create(&self, account: &Account) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.by_name.contains_key(account.name()) {
            return Err(AccountError::AlreadyExists(account.name().to_string()));
        }
        if tables.by_id.contains_key(&account.id()) {
            return Err(AccountError::AlreadyExists(account.id().to_string()));
        }
        tables
            .by_name
            .insert(account.name().to_string(), account.id());
        tables.by_id.insert(account.id(), account.clone());
        Ok(())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Account>> {
        let tables = self.tables.read().await;
        Ok(tables
            .by_name
            .get(name)
            .and_then(|id| tables.by_id.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>> {
        Ok(self.tables.read().await.by_id.get(&id).cloned())
    }

    async fn find_many_by_id(&self, ids: &[AccountId]) -> Result<Vec<Account>> {
        let tables = self.tables.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| tables.by_id.get(id))
            .cloned()
            .collect())
    }

    async fn update(&self, account: &Account) -> Result<()> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .by_id
            .get_mut(&account.id())
            .ok_or_else(|| AccountError::NotFound(account.id().to_string()))?;
        *stored = account.clone();
        Ok(())
    }

    async fn update_unmodified_since(
        &self,
        account: &Account,
        observed: DateTime<Utc>,
    ) -> Result<()> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .by_id
            .get_mut(&account.id())
            .ok_or_else(|| AccountError::NotFound(account.id().to_string()))?;
        if stored.updated_at() != observed {
            return Err(AccountError::Conflict);
        }
        *stored = account.clone();
        Ok(())
    }
}

/// Edge set indexed both by follower and by followee.
#[derive(Default)]
struct FollowIndex {
    by_from: HashMap<AccountId, Vec<AccountFollow>>,
    by_target: HashMap<AccountId, Vec<AccountFollow>>,
}

#[derive(Default)]
pub struct InMemoryFollowRepository {
    index: RwLock<FollowIndex>,
}

impl InMemoryFollowRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FollowRepository for InMemoryFollowRepository {
    async fn create(&self, follow: &AccountFollow) -> Result<()> {
        let mut index = self.index.write().await;
        let followings = index.by_from.entry(follow.from_id()).or_default();
        if followings
            .iter()
            .any(|f| f.target_id() == follow.target_id())
        {
            return Ok(());
        }
        followings.push(follow.clone());
        index
            .by_target
            .entry(follow.target_id())
            .or_default()
            .push(follow.clone());
        Ok(())
    }

    async fn delete(&self, from_id: AccountId, target_id: AccountId) -> Result<()> {
        let mut index = self.index.write().await;
        if let Some(followings) = index.by_from.get_mut(&from_id) {
            followings.retain(|f| f.target_id() != target_id);
        }
        if let Some(followers) = index.by_target.get_mut(&target_id) {
            followers.retain(|f| f.from_id() != from_id);
        }
        Ok(())
    }

    async fn find_followings(&self, id: AccountId) -> Result<Vec<AccountFollow>> {
        Ok(self
            .index
            .read()
            .await
            .by_from
            .get(&id)
            .cloned()
            .unwrap_or_default())
    }

    async fn find_followers(&self, id: AccountId) -> Result<Vec<AccountFollow>> {
        Ok(self
            .index
            .read()
            .await
            .by_target
            .get(&id)
            .cloned()
            .unwrap_or_default())
    }
}

#[derive(Default)]
pub struct InMemoryVerifyTokenRepository {
    tokens: RwLock<HashMap<AccountId, VerifyToken>>,
}

impl InMemoryVerifyTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VerifyTokenRepository for InMemoryVerifyTokenRepository {
    async fn create(&self, token: &VerifyToken) -> Result<()> {
        self.tokens
            .write()
            .await
            .insert(token.account_id, token.clone());
        Ok(())
    }

    async fn find_by_account_id(&self, id: AccountId) -> Result<Option<VerifyToken>> {
        Ok(self.tokens.read().await.get(&id).cloned())
    }

    async fn delete(&self, id: AccountId) -> Result<()> {
        self.tokens.write().await.remove(&id);
        Ok(())
    }
}
