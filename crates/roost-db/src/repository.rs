//! SQLite implementations of the roost-accounts repository traits.
//!
//! rusqlite is blocking, so every call runs on `spawn_blocking` with its own
//! handle to the shared [`Database`].

use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use roost_accounts::error::{AccountError, Result};
use roost_accounts::repository::{AccountRepository, FollowRepository, VerifyTokenRepository};
use roost_types::models::{Account, AccountFollow, AccountId, VerifyToken};
use tracing::error;

use crate::Database;
use crate::models::{AccountRow, FollowRow, VerifyTokenRow, format_timestamp};

async fn blocking<F, T>(db: &Arc<Database>, f: F) -> Result<T>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let db = db.clone();
    let out = tokio::task::spawn_blocking(move || f(&db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            anyhow!("database task failed: {}", e)
        })??;
    Ok(out)
}

pub struct SqliteAccountRepository {
    db: Arc<Database>,
}

impl SqliteAccountRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AccountRepository for SqliteAccountRepository {
    async fn create(&self, account: &Account) -> Result<()> {
        let row = AccountRow::from(account);
        let inserted = blocking(&self.db, move |db| db.insert_account(&row)).await?;
        if !inserted {
            return Err(AccountError::AlreadyExists(account.name().to_string()));
        }
        Ok(())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Account>> {
        let name = name.to_string();
        blocking(&self.db, move |db| {
            db.get_account_by_name(&name)?.map(Account::try_from).transpose()
        })
        .await
    }

    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>> {
        blocking(&self.db, move |db| {
            db.get_account_by_id(&id.to_string())?
                .map(Account::try_from)
                .transpose()
        })
        .await
    }

    async fn find_many_by_id(&self, ids: &[AccountId]) -> Result<Vec<Account>> {
        let ids: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
        blocking(&self.db, move |db| {
            db.get_accounts_by_ids(&ids)?
                .into_iter()
                .map(Account::try_from)
                .collect()
        })
        .await
    }

    async fn update(&self, account: &Account) -> Result<()> {
        let row = AccountRow::from(account);
        let changed = blocking(&self.db, move |db| db.update_account(&row)).await?;
        if changed == 0 {
            return Err(AccountError::NotFound(account.id().to_string()));
        }
        Ok(())
    }

    async fn update_unmodified_since(
        &self,
        account: &Account,
        observed: DateTime<Utc>,
    ) -> Result<()> {
        let row = AccountRow::from(account);
        let observed = format_timestamp(observed);
        let id = account.id();
        let changed = blocking(&self.db, move |db| {
            let changed = db.update_account_unmodified_since(&row, &observed)?;
            // Tell "someone else wrote first" apart from "no such account".
            if changed == 0 && db.get_account_by_id(&row.id)?.is_none() {
                return Ok(None);
            }
            Ok(Some(changed))
        })
        .await?;

        match changed {
            None => Err(AccountError::NotFound(id.to_string())),
            Some(0) => Err(AccountError::Conflict),
            Some(_) => Ok(()),
        }
    }
}

pub struct SqliteFollowRepository {
    db: Arc<Database>,
}

impl SqliteFollowRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

fn into_follows(rows: Vec<FollowRow>) -> anyhow::Result<Vec<AccountFollow>> {
    rows.into_iter().map(AccountFollow::try_from).collect()
}

#[async_trait]
impl FollowRepository for SqliteFollowRepository {
    async fn create(&self, follow: &AccountFollow) -> Result<()> {
        let row = FollowRow {
            from_id: follow.from_id().to_string(),
            target_id: follow.target_id().to_string(),
            created_at: format_timestamp(follow.created_at()),
        };
        blocking(&self.db, move |db| db.insert_follow(&row)).await
    }

    async fn delete(&self, from_id: AccountId, target_id: AccountId) -> Result<()> {
        blocking(&self.db, move |db| {
            db.delete_follow(&from_id.to_string(), &target_id.to_string())
        })
        .await
    }

    async fn find_followings(&self, id: AccountId) -> Result<Vec<AccountFollow>> {
        blocking(&self.db, move |db| into_follows(db.get_followings(&id.to_string())?)).await
    }

    async fn find_followers(&self, id: AccountId) -> Result<Vec<AccountFollow>> {
        blocking(&self.db, move |db| into_follows(db.get_followers(&id.to_string())?)).await
    }
}

pub struct SqliteVerifyTokenRepository {
    db: Arc<Database>,
}

impl SqliteVerifyTokenRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl VerifyTokenRepository for SqliteVerifyTokenRepository {
    async fn create(&self, token: &VerifyToken) -> Result<()> {
        let row = VerifyTokenRow::from(token);
        blocking(&self.db, move |db| db.upsert_verify_token(&row)).await
    }

    async fn find_by_account_id(&self, id: AccountId) -> Result<Option<VerifyToken>> {
        blocking(&self.db, move |db| {
            db.get_verify_token(&id.to_string())?
                .map(VerifyToken::try_from)
                .transpose()
        })
        .await
    }

    async fn delete(&self, id: AccountId) -> Result<()> {
        blocking(&self.db, move |db| db.delete_verify_token(&id.to_string())).await
    }
}
