use std::sync::Arc;

use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::error::{AccountError, Result};
use crate::repository::{AccountRepository, VerifyTokenRepository, update_by_name};

/// Only the digests are compared, never the secrets themselves.
fn tokens_match(expected: &str, presented: &str) -> bool {
    Sha256::digest(expected.as_bytes()) == Sha256::digest(presented.as_bytes())
}

/// Consumes a mailbox verification token and activates the account.
pub struct VerifyAccountTokenService {
    accounts: Arc<dyn AccountRepository>,
    tokens: Arc<dyn VerifyTokenRepository>,
}

impl VerifyAccountTokenService {
    pub fn new(accounts: Arc<dyn AccountRepository>, tokens: Arc<dyn VerifyTokenRepository>) -> Self {
        Self { accounts, tokens }
    }

    pub async fn verify(&self, name: &str, token: &str) -> Result<()> {
        let account = self
            .accounts
            .find_by_name(name)
            .await?
            .ok_or_else(|| AccountError::NotFound(name.to_string()))?;

        let live = self
            .tokens
            .find_by_account_id(account.id())
            .await?
            .ok_or_else(|| AccountError::NotFound(format!("verification token for {}", name)))?;

        if !tokens_match(&live.token, token) {
            return Err(AccountError::TokenMismatch);
        }
        if live.is_expired(Utc::now()) {
            return Err(AccountError::Expired);
        }

        update_by_name(self.accounts.as_ref(), name, |stored| {
            stored.activate()?;
            Ok(true)
        })
        .await?;
        self.tokens.delete(account.id()).await?;

        info!("Account {} verified its mailbox", name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use roost_types::models::AccountStatus;

    use crate::test_support::{Fixture, InterleavedAccountRepository};

    fn service(fx: &Fixture) -> VerifyAccountTokenService {
        VerifyAccountTokenService::new(fx.accounts.clone(), fx.tokens.clone())
    }

    #[tokio::test]
    async fn correct_token_activates_once() {
        let fx = Fixture::new();
        let alice = fx.seed("alice").await;
        let token = fx.token_issuer(Duration::hours(1)).issue(&alice).await.unwrap();
        let service = service(&fx);

        service.verify("alice", &token.token).await.unwrap();
        let stored = fx.accounts.find_by_name("alice").await.unwrap().unwrap();
        assert_eq!(stored.status(), AccountStatus::Active);
        assert!(fx.tokens.find_by_account_id(alice.id()).await.unwrap().is_none());

        let err = service.verify("alice", &token.token).await.unwrap_err();
        assert!(matches!(err, AccountError::NotFound(_)));
    }

    #[tokio::test]
    async fn wrong_token_is_a_mismatch() {
        let fx = Fixture::new();
        let alice = fx.seed("alice").await;
        fx.token_issuer(Duration::hours(1)).issue(&alice).await.unwrap();

        let err = service(&fx).verify("alice", "guess").await.unwrap_err();
        assert!(matches!(err, AccountError::TokenMismatch));
        let stored = fx.accounts.find_by_name("alice").await.unwrap().unwrap();
        assert_eq!(stored.status(), AccountStatus::NotActivated);
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let fx = Fixture::new();
        let alice = fx.seed("alice").await;
        let token = fx
            .token_issuer(Duration::seconds(-1))
            .issue(&alice)
            .await
            .unwrap();

        let err = service(&fx).verify("alice", &token.token).await.unwrap_err();
        assert!(matches!(err, AccountError::Expired));
    }

    #[tokio::test]
    async fn unknown_account_is_not_found() {
        let fx = Fixture::new();
        let err = service(&fx).verify("nobody", "token").await.unwrap_err();
        assert!(matches!(err, AccountError::NotFound(_)));
    }

    #[tokio::test]
    async fn activation_keeps_an_edit_committed_after_its_read() {
        let fx = Fixture::new();
        let alice = fx.seed("alice").await;
        let token = fx.token_issuer(Duration::hours(1)).issue(&alice).await.unwrap();
        let accounts = Arc::new(InterleavedAccountRepository::new(fx.accounts.clone(), "NEW"));

        VerifyAccountTokenService::new(accounts, fx.tokens.clone())
            .verify("alice", &token.token)
            .await
            .unwrap();

        let stored = fx.accounts.find_by_name("alice").await.unwrap().unwrap();
        assert_eq!(stored.nickname(), "NEW");
        assert_eq!(stored.status(), AccountStatus::Active);
    }

    #[test]
    fn token_comparison() {
        assert!(tokens_match("abc123", "abc123"));
        assert!(!tokens_match("abc123", "abc124"));
        assert!(!tokens_match("abc123", "abc12"));
        assert!(!tokens_match("abc123", ""));
    }
}
