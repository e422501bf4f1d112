use std::sync::Arc;

use chrono::Utc;
use roost_types::models::{Account, AccountFollow};
use tracing::info;

use crate::error::{AccountError, Result};
use crate::repository::{AccountRepository, FollowRepository};

pub struct FollowService {
    accounts: Arc<dyn AccountRepository>,
    follows: Arc<dyn FollowRepository>,
}

impl FollowService {
    pub fn new(accounts: Arc<dyn AccountRepository>, follows: Arc<dyn FollowRepository>) -> Self {
        Self { accounts, follows }
    }

    /// Make `from_name` follow `target_name`. Following twice is a no-op.
    pub async fn handle(&self, from_name: &str, target_name: &str) -> Result<()> {
        let from = self.resolve(from_name).await?;
        let target = self.resolve(target_name).await?;

        let follow = AccountFollow::new(from.id(), target.id(), Utc::now())?;
        self.follows.create(&follow).await?;

        info!("{} follows {}", from_name, target_name);
        Ok(())
    }

    async fn resolve(&self, name: &str) -> Result<Account> {
        self.accounts
            .find_by_name(name)
            .await?
            .ok_or_else(|| AccountError::NotFound(name.to_string()))
    }
}
