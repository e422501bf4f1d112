use std::sync::Arc;

use roost_types::models::{Account, AccountId, Role};
use tracing::{info, warn};

use crate::error::{AccountError, Result};
use crate::passphrase::PassphraseHasher;
use crate::repository::AccountRepository;
use crate::verification::VerifyTokenIssuer;

pub struct RegisterService {
    accounts: Arc<dyn AccountRepository>,
    hasher: Arc<dyn PassphraseHasher>,
    verify_tokens: Arc<VerifyTokenIssuer>,
}

impl RegisterService {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        hasher: Arc<dyn PassphraseHasher>,
        verify_tokens: Arc<VerifyTokenIssuer>,
    ) -> Self {
        Self {
            accounts,
            hasher,
            verify_tokens,
        }
    }

    /// Create a not-yet-activated account and mail it a verification token.
    pub async fn handle(
        &self,
        name: &str,
        mail: &str,
        nickname: &str,
        passphrase: &str,
        role: Role,
    ) -> Result<Account> {
        if self.accounts.find_by_name(name).await?.is_some() {
            return Err(AccountError::AlreadyExists(name.to_string()));
        }

        let passphrase_hash = self.hasher.hash(passphrase)?;
        let account = Account::register(AccountId::new(), name, mail, nickname, passphrase_hash, role);

        // The repository re-checks uniqueness, so a racing registration
        // still ends in AlreadyExists.
        self.accounts.create(&account).await?;
        info!("Registered account {} ({})", account.name(), account.id());

        // Resend can recover a lost token, so a failure here keeps the account.
        if let Err(e) = self.verify_tokens.issue(&account).await {
            warn!(
                "Account {} registered but verification token was not issued: {}",
                account.name(),
                e
            );
        }

        Ok(account)
    }
}
