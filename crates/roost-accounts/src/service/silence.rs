use std::sync::Arc;

use roost_types::models::SilencedState;
use tracing::info;

use crate::error::Result;
use crate::repository::{AccountRepository, update_by_name};

pub struct SilenceService {
    accounts: Arc<dyn AccountRepository>,
}

impl SilenceService {
    pub fn new(accounts: Arc<dyn AccountRepository>) -> Self {
        Self { accounts }
    }

    pub async fn set_silence(&self, name: &str) -> Result<()> {
        self.apply(name, SilencedState::Silenced).await
    }

    pub async fn undo_silence(&self, name: &str) -> Result<()> {
        self.apply(name, SilencedState::Normal).await
    }

    async fn apply(&self, name: &str, state: SilencedState) -> Result<()> {
        update_by_name(self.accounts.as_ref(), name, |account| {
            if account.silenced() == state {
                return Ok(false);
            }
            account.set_silenced(state)?;
            Ok(true)
        })
        .await?;

        info!("Account {} is now {}", name, state);
        Ok(())
    }
}
