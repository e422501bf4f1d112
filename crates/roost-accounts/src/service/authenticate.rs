use std::sync::{Arc, OnceLock};

use tracing::{info, warn};

use crate::error::{AccountError, Result};
use crate::passphrase::PassphraseHasher;
use crate::repository::AccountRepository;
use crate::token::{TokenIssuer, TokenPair};

const PLACEHOLDER_PASSPHRASE: &str = "roost-login-placeholder";

/// Passphrase login. Unknown, deleted and wrong-passphrase attempts all fail
/// with the same `InvalidCredential` so callers cannot probe for names.
///
/// Attempts without a usable account still run one passphrase verification,
/// against a placeholder hash, so they cost as much as a wrong passphrase.
pub struct AuthenticateService {
    accounts: Arc<dyn AccountRepository>,
    hasher: Arc<dyn PassphraseHasher>,
    issuer: Arc<dyn TokenIssuer>,
    placeholder_hash: OnceLock<String>,
}

impl AuthenticateService {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        hasher: Arc<dyn PassphraseHasher>,
        issuer: Arc<dyn TokenIssuer>,
    ) -> Self {
        Self {
            accounts,
            hasher,
            issuer,
            placeholder_hash: OnceLock::new(),
        }
    }

    pub async fn handle(&self, name: &str, passphrase: &str) -> Result<TokenPair> {
        let Some(account) = self.accounts.find_by_name(name).await? else {
            warn!("Login attempt for unknown account {}", name);
            return self.reject_without_account(passphrase);
        };

        if account.is_deleted() {
            warn!("Login attempt for deleted account {}", name);
            return self.reject_without_account(passphrase);
        }

        if !self.hasher.verify(passphrase, account.passphrase_hash())? {
            warn!("Wrong passphrase for account {}", name);
            return Err(AccountError::InvalidCredential);
        }

        let pair = self.issuer.issue(&account)?;
        info!("Account {} logged in", name);
        Ok(pair)
    }

    fn reject_without_account(&self, passphrase: &str) -> Result<TokenPair> {
        let hash = match self.placeholder_hash.get() {
            Some(hash) => hash,
            None => {
                let hash = self.hasher.hash(PLACEHOLDER_PASSPHRASE)?;
                self.placeholder_hash.get_or_init(|| hash)
            }
        };
        self.hasher.verify(passphrase, hash)?;
        Err(AccountError::InvalidCredential)
    }
}
