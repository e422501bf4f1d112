use std::sync::Arc;

use roost_types::models::Account;
use tracing::{debug, info};

use super::etag::EtagService;
use crate::error::{AccountError, Result};
use crate::passphrase::PassphraseHasher;
use crate::repository::AccountRepository;

/// Profile changes applied together. `None` leaves a field untouched.
#[derive(Debug, Default, Clone)]
pub struct AccountEdit {
    pub nickname: Option<String>,
    pub mail: Option<String>,
    pub passphrase: Option<String>,
    pub bio: Option<String>,
}

impl AccountEdit {
    fn is_empty(&self) -> bool {
        self.nickname.is_none()
            && self.mail.is_none()
            && self.passphrase.is_none()
            && self.bio.is_none()
    }
}

/// Profile edits under optimistic concurrency control.
///
/// Every edit carries the etag the caller last observed. A stale tag fails
/// with `Conflict` before anything is written, and the write itself is
/// conditional on nobody else having committed since the account was read.
pub struct EditService {
    accounts: Arc<dyn AccountRepository>,
    hasher: Arc<dyn PassphraseHasher>,
    etag: EtagService,
}

impl EditService {
    pub fn new(accounts: Arc<dyn AccountRepository>, hasher: Arc<dyn PassphraseHasher>) -> Self {
        Self {
            accounts,
            hasher,
            etag: EtagService::new(),
        }
    }

    pub async fn edit_nickname(&self, etag: &str, name: &str, nickname: &str) -> Result<Account> {
        let edit = AccountEdit {
            nickname: Some(nickname.to_string()),
            ..Default::default()
        };
        self.edit(etag, name, edit).await
    }

    pub async fn edit_passphrase(&self, etag: &str, name: &str, passphrase: &str) -> Result<Account> {
        let edit = AccountEdit {
            passphrase: Some(passphrase.to_string()),
            ..Default::default()
        };
        self.edit(etag, name, edit).await
    }

    pub async fn edit_email(&self, etag: &str, name: &str, mail: &str) -> Result<Account> {
        let edit = AccountEdit {
            mail: Some(mail.to_string()),
            ..Default::default()
        };
        self.edit(etag, name, edit).await
    }

    pub async fn edit_bio(&self, etag: &str, name: &str, bio: &str) -> Result<Account> {
        let edit = AccountEdit {
            bio: Some(bio.to_string()),
            ..Default::default()
        };
        self.edit(etag, name, edit).await
    }

    /// Apply every field in `edit` as a single write, or none of them.
    pub async fn edit(&self, etag: &str, name: &str, edit: AccountEdit) -> Result<Account> {
        let mut account = self
            .accounts
            .find_by_name(name)
            .await?
            .ok_or_else(|| AccountError::NotFound(name.to_string()))?;

        if !self.etag.compare(&account, etag) {
            debug!("Stale etag for account {}", name);
            return Err(AccountError::Conflict);
        }

        if edit.is_empty() {
            return Ok(account);
        }

        let observed = account.updated_at();

        if let Some(passphrase) = edit.passphrase {
            let hash = self.hasher.hash(&passphrase)?;
            account.set_passphrase_hash(hash)?;
        }
        if let Some(nickname) = edit.nickname {
            account.set_nickname(nickname)?;
        }
        if let Some(mail) = edit.mail {
            account.set_mail(mail)?;
        }
        if let Some(bio) = edit.bio {
            account.set_bio(bio)?;
        }

        self.accounts
            .update_unmodified_since(&account, observed)
            .await?;
        info!("Updated profile of account {}", name);

        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passphrase::Argon2Hasher;
    use crate::test_support::Fixture;

    fn service(fx: &Fixture) -> EditService {
        EditService::new(fx.accounts.clone(), Arc::new(Argon2Hasher))
    }

    async fn stored(fx: &Fixture, name: &str) -> Account {
        fx.accounts.find_by_name(name).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn fresh_etag_edits_succeed() {
        let fx = Fixture::new();
        let alice = fx.seed("alice").await;
        let service = service(&fx);
        let tag = EtagService.generate(&alice);

        let updated = service.edit_nickname(&tag, "alice", "Alice B.").await.unwrap();
        assert_eq!(updated.nickname(), "Alice B.");
        assert_eq!(stored(&fx, "alice").await.nickname(), "Alice B.");

        let tag = EtagService.generate(&stored(&fx, "alice").await);
        let updated = service
            .edit_email(&tag, "alice", "alice@new.example")
            .await
            .unwrap();
        assert_eq!(updated.mail(), "alice@new.example");
    }

    #[tokio::test]
    async fn stale_etag_conflicts_and_changes_nothing() {
        let fx = Fixture::new();
        let alice = fx.seed("alice").await;
        let service = service(&fx);
        let tag = EtagService.generate(&alice);

        service.edit_nickname(&tag, "alice", "first").await.unwrap();

        let err = service.edit_nickname(&tag, "alice", "second").await.unwrap_err();
        assert!(matches!(err, AccountError::Conflict));
        let err = service
            .edit_email(&tag, "alice", "x@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::Conflict));

        let now = stored(&fx, "alice").await;
        assert_eq!(now.nickname(), "first");
        assert_eq!(now.mail(), "alice@example.com");
    }

    #[tokio::test]
    async fn bio_edit_keeps_the_tag_valid() {
        let fx = Fixture::new();
        let alice = fx.seed("alice").await;
        let service = service(&fx);
        let tag = EtagService.generate(&alice);

        service.edit_bio(&tag, "alice", "hello").await.unwrap();
        let updated = service.edit_bio(&tag, "alice", "hello again").await.unwrap();
        assert_eq!(updated.bio(), "hello again");
    }

    #[tokio::test]
    async fn passphrase_is_stored_hashed() {
        let fx = Fixture::new();
        let alice = fx.seed("alice").await;
        let tag = EtagService.generate(&alice);

        service(&fx)
            .edit_passphrase(&tag, "alice", "new secret")
            .await
            .unwrap();

        let hash = stored(&fx, "alice").await.passphrase_hash().to_string();
        assert_ne!(hash, "new secret");
        assert!(Argon2Hasher.verify("new secret", &hash).unwrap());
    }

    #[tokio::test]
    async fn combined_edit_is_all_or_nothing() {
        let fx = Fixture::new();
        let alice = fx.seed("alice").await;
        let service = service(&fx);

        let edit = AccountEdit {
            nickname: Some("Al".into()),
            bio: Some("bio".into()),
            ..Default::default()
        };
        let err = service.edit("bogus", "alice", edit.clone()).await.unwrap_err();
        assert!(matches!(err, AccountError::Conflict));
        assert_eq!(stored(&fx, "alice").await, alice);

        let updated = service
            .edit(&EtagService.generate(&alice), "alice", edit)
            .await
            .unwrap();
        assert_eq!(updated.nickname(), "Al");
        assert_eq!(updated.bio(), "bio");
    }

    #[tokio::test]
    async fn unknown_account_is_not_found() {
        let fx = Fixture::new();
        let err = service(&fx).edit_bio("tag", "nobody", "bio").await.unwrap_err();
        assert!(matches!(err, AccountError::NotFound(_)));
    }

    #[tokio::test]
    async fn racing_editors_with_the_same_tag_do_not_both_win() {
        let fx = Fixture::new();
        let alice = fx.seed("alice").await;
        let service = Arc::new(service(&fx));
        let tag = EtagService.generate(&alice);

        let a = {
            let (service, tag) = (service.clone(), tag.clone());
            tokio::spawn(async move { service.edit_nickname(&tag, "alice", "A").await })
        };
        let b = {
            let (service, tag) = (service.clone(), tag.clone());
            tokio::spawn(async move { service.edit_nickname(&tag, "alice", "B").await })
        };
        let results = [a.await.unwrap(), b.await.unwrap()];

        let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(winners.len(), 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(AccountError::Conflict))));
        assert_eq!(stored(&fx, "alice").await.nickname(), winners[0].nickname());
    }
}
