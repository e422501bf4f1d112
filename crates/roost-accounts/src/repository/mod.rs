//! Storage contracts consumed by the services.
//!
//! Implementations must make single-record writes atomic. Nothing here
//! spans more than one record, so no transaction support is required.

mod memory;

pub use memory::{InMemoryAccountRepository, InMemoryFollowRepository, InMemoryVerifyTokenRepository};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use roost_types::models::{Account, AccountFollow, AccountId, VerifyToken};
use tracing::debug;

use crate::error::{AccountError, Result};

/// Writers that are not bound to an etag give up after this many lost races.
const MAX_WRITE_ATTEMPTS: usize = 5;

#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Fails with `AlreadyExists` when the name is taken.
    async fn create(&self, account: &Account) -> Result<()>;

    async fn find_by_name(&self, name: &str) -> Result<Option<Account>>;

    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>>;

    /// Returns the accounts that exist, in no particular order.
    async fn find_many_by_id(&self, ids: &[AccountId]) -> Result<Vec<Account>>;

    /// Unconditional overwrite. Fails with `NotFound` when the id is unknown.
    async fn update(&self, account: &Account) -> Result<()>;

    /// Overwrite only if the stored record still carries `observed` as its
    /// `updated_at`; otherwise fail with `Conflict`.
    async fn update_unmodified_since(
        &self,
        account: &Account,
        observed: DateTime<Utc>,
    ) -> Result<()>;
}

#[async_trait]
pub trait FollowRepository: Send + Sync {
    /// Creating an edge that already exists succeeds without a second copy.
    async fn create(&self, follow: &AccountFollow) -> Result<()>;

    /// Deleting a missing edge succeeds.
    async fn delete(&self, from_id: AccountId, target_id: AccountId) -> Result<()>;

    /// Edges where `id` is the follower, oldest first.
    async fn find_followings(&self, id: AccountId) -> Result<Vec<AccountFollow>>;

    /// Edges where `id` is the followee, oldest first.
    async fn find_followers(&self, id: AccountId) -> Result<Vec<AccountFollow>>;
}

#[async_trait]
pub trait VerifyTokenRepository: Send + Sync {
    /// Stores `token` as the account's only live token, replacing any other.
    async fn create(&self, token: &VerifyToken) -> Result<()>;

    async fn find_by_account_id(&self, id: AccountId) -> Result<Option<VerifyToken>>;

    async fn delete(&self, id: AccountId) -> Result<()>;
}

/// Read the account called `name`, apply `change` and write it back only if
/// nobody committed in between. A lost race re-reads and reapplies `change`.
///
/// `change` returns `false` when the account already has the wanted state;
/// nothing is written then.
pub(crate) async fn update_by_name<F>(
    accounts: &dyn AccountRepository,
    name: &str,
    mut change: F,
) -> Result<Account>
where
    F: FnMut(&mut Account) -> Result<bool> + Send,
{
    for _ in 0..MAX_WRITE_ATTEMPTS {
        let mut account = accounts
            .find_by_name(name)
            .await?
            .ok_or_else(|| AccountError::NotFound(name.to_string()))?;
        let observed = account.updated_at();

        if !change(&mut account)? {
            return Ok(account);
        }

        match accounts.update_unmodified_since(&account, observed).await {
            Ok(()) => return Ok(account),
            Err(AccountError::Conflict) => {
                debug!("Account {} changed during update, retrying", name);
            }
            Err(e) => return Err(e),
        }
    }

    Err(AccountError::Conflict)
}
