use std::sync::Arc;

use tracing::info;

use crate::error::{AccountError, Result};
use crate::repository::{AccountRepository, FollowRepository};

pub struct UnfollowService {
    accounts: Arc<dyn AccountRepository>,
    follows: Arc<dyn FollowRepository>,
}

impl UnfollowService {
    pub fn new(accounts: Arc<dyn AccountRepository>, follows: Arc<dyn FollowRepository>) -> Self {
        Self { accounts, follows }
    }

    /// Remove the edge if there is one; a missing edge is not an error.
    pub async fn handle(&self, from_name: &str, target_name: &str) -> Result<()> {
        let from = self
            .accounts
            .find_by_name(from_name)
            .await?
            .ok_or_else(|| AccountError::NotFound(from_name.to_string()))?;
        let target = self
            .accounts
            .find_by_name(target_name)
            .await?
            .ok_or_else(|| AccountError::NotFound(target_name.to_string()))?;

        self.follows.delete(from.id(), target.id()).await?;
        info!("{} unfollowed {}", from_name, target_name);
        Ok(())
    }
}
