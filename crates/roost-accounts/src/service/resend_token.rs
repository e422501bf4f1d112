use std::sync::Arc;

use roost_types::models::AccountStatus;
use tracing::info;

use crate::error::{AccountError, Result};
use crate::repository::AccountRepository;
use crate::verification::VerifyTokenIssuer;

/// Replaces an account's verification token with a fresh one.
pub struct ResendVerifyTokenService {
    accounts: Arc<dyn AccountRepository>,
    verify_tokens: Arc<VerifyTokenIssuer>,
}

impl ResendVerifyTokenService {
    pub fn new(accounts: Arc<dyn AccountRepository>, verify_tokens: Arc<VerifyTokenIssuer>) -> Self {
        Self {
            accounts,
            verify_tokens,
        }
    }

    pub async fn handle(&self, name: &str) -> Result<()> {
        let account = self
            .accounts
            .find_by_name(name)
            .await?
            .ok_or_else(|| AccountError::NotFound(name.to_string()))?;

        if account.status() != AccountStatus::NotActivated {
            return Err(AccountError::InvalidOperation(format!(
                "account {} is {}, nothing to verify",
                name,
                account.status()
            )));
        }

        self.verify_tokens.issue(&account).await?;
        info!("Re-sent verification token to account {}", name);
        Ok(())
    }
}
