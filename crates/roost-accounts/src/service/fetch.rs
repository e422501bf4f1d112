use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use roost_types::models::{Account, AccountId};

use crate::error::{AccountError, Result};
use crate::repository::AccountRepository;

pub struct FetchService {
    accounts: Arc<dyn AccountRepository>,
}

impl FetchService {
    pub fn new(accounts: Arc<dyn AccountRepository>) -> Self {
        Self { accounts }
    }

    pub async fn fetch_account(&self, name: &str) -> Result<Account> {
        self.accounts
            .find_by_name(name)
            .await?
            .ok_or_else(|| AccountError::NotFound(name.to_string()))
    }

    pub async fn fetch_account_by_id(&self, id: AccountId) -> Result<Account> {
        self.accounts
            .find_by_id(id)
            .await?
            .ok_or_else(|| AccountError::NotFound(id.to_string()))
    }

    /// Accounts for `ids`, in the order given. Ids that do not resolve are
    /// skipped; a repeated id yields its account once.
    pub async fn fetch_many_accounts_by_id(&self, ids: &[AccountId]) -> Result<Vec<Account>> {
        let mut seen = HashSet::with_capacity(ids.len());
        let unique: Vec<AccountId> = ids.iter().copied().filter(|id| seen.insert(*id)).collect();

        let mut found: HashMap<AccountId, Account> = self
            .accounts
            .find_many_by_id(&unique)
            .await?
            .into_iter()
            .map(|a| (a.id(), a))
            .collect();

        Ok(unique.iter().filter_map(|id| found.remove(id)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Fixture;

    #[tokio::test]
    async fn fetch_by_name_and_id() {
        let fx = Fixture::new();
        let alice = fx.seed("alice").await;
        let service = FetchService::new(fx.accounts.clone());

        assert_eq!(service.fetch_account("alice").await.unwrap(), alice);
        assert_eq!(service.fetch_account_by_id(alice.id()).await.unwrap(), alice);

        let err = service.fetch_account("nobody").await.unwrap_err();
        assert!(matches!(err, AccountError::NotFound(_)));
        let err = service.fetch_account_by_id(AccountId::new()).await.unwrap_err();
        assert!(matches!(err, AccountError::NotFound(_)));
    }

    #[tokio::test]
    async fn bulk_fetch_follows_the_requested_order() {
        let fx = Fixture::new();
        let a = fx.seed("a").await;
        let b = fx.seed("b").await;
        let c = fx.seed("c").await;
        let service = FetchService::new(fx.accounts.clone());

        let ids = [c.id(), AccountId::new(), a.id(), c.id(), b.id()];
        let names: Vec<String> = service
            .fetch_many_accounts_by_id(&ids)
            .await
            .unwrap()
            .iter()
            .map(|acc| acc.name().to_string())
            .collect();
        assert_eq!(names, ["c", "a", "b"]);
    }

    #[tokio::test]
    async fn bulk_fetch_of_nothing_is_empty() {
        let fx = Fixture::new();
        let service = FetchService::new(fx.accounts.clone());
        assert!(service.fetch_many_accounts_by_id(&[]).await.unwrap().is_empty());
    }
}
