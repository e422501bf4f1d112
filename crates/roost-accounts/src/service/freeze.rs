use std::sync::Arc;

use roost_types::models::FrozenState;
use tracing::info;

use crate::error::Result;
use crate::repository::{AccountRepository, update_by_name};

pub struct FreezeService {
    accounts: Arc<dyn AccountRepository>,
}

impl FreezeService {
    pub fn new(accounts: Arc<dyn AccountRepository>) -> Self {
        Self { accounts }
    }

    pub async fn set_freeze(&self, name: &str) -> Result<()> {
        self.apply(name, FrozenState::Frozen).await
    }

    pub async fn undo_freeze(&self, name: &str) -> Result<()> {
        self.apply(name, FrozenState::Normal).await
    }

    async fn apply(&self, name: &str, state: FrozenState) -> Result<()> {
        update_by_name(self.accounts.as_ref(), name, |account| {
            if account.frozen() == state {
                return Ok(false);
            }
            account.set_frozen(state)?;
            Ok(true)
        })
        .await?;

        info!("Account {} is now {}", name, state);
        Ok(())
    }
}
