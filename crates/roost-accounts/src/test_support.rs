use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use roost_types::models::{Account, AccountId, Role, VerifyToken};

use crate::error::Result;
use crate::repository::{
    AccountRepository, InMemoryAccountRepository, InMemoryFollowRepository,
    InMemoryVerifyTokenRepository,
};
use crate::verification::{VerificationMailer, VerifyTokenIssuer};

pub(crate) fn account(name: &str) -> Account {
    Account::register(
        AccountId::new(),
        name,
        format!("{}@example.com", name),
        name.to_uppercase(),
        "hash",
        Role::Normal,
    )
}

/// Keeps every token it is asked to deliver.
#[derive(Default)]
pub(crate) struct RecordingMailer {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingMailer {
    pub(crate) fn last_token_for(&self, name: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(to, _)| to == name)
            .map(|(_, token)| token.clone())
    }

    pub(crate) fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl VerificationMailer for RecordingMailer {
    async fn send(&self, account: &Account, token: &VerifyToken) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((account.name().to_string(), token.token.clone()));
        Ok(())
    }
}

pub(crate) struct FailingMailer;

#[async_trait]
impl VerificationMailer for FailingMailer {
    async fn send(&self, _account: &Account, _token: &VerifyToken) -> Result<()> {
        Err(anyhow!("smtp unreachable").into())
    }
}

pub(crate) struct Fixture {
    pub(crate) accounts: Arc<InMemoryAccountRepository>,
    pub(crate) follows: Arc<InMemoryFollowRepository>,
    pub(crate) tokens: Arc<InMemoryVerifyTokenRepository>,
    pub(crate) mailer: Arc<RecordingMailer>,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        Self {
            accounts: Arc::new(InMemoryAccountRepository::new()),
            follows: Arc::new(InMemoryFollowRepository::new()),
            tokens: Arc::new(InMemoryVerifyTokenRepository::new()),
            mailer: Arc::new(RecordingMailer::default()),
        }
    }

    pub(crate) async fn seed(&self, name: &str) -> Account {
        let account = account(name);
        self.accounts.create(&account).await.unwrap();
        account
    }

    pub(crate) fn token_issuer(&self, ttl: Duration) -> Arc<VerifyTokenIssuer> {
        Arc::new(VerifyTokenIssuer::new(
            self.tokens.clone(),
            self.mailer.clone(),
            ttl,
        ))
    }
}

/// Wraps an in-memory store and, right after the first `find_by_name`,
/// commits a nickname change as a concurrent editor would. The caller still
/// gets the snapshot from before that edit.
pub(crate) struct InterleavedAccountRepository {
    pub(crate) inner: Arc<InMemoryAccountRepository>,
    nickname: Mutex<Option<String>>,
}

impl InterleavedAccountRepository {
    pub(crate) fn new(inner: Arc<InMemoryAccountRepository>, nickname: &str) -> Self {
        Self {
            inner,
            nickname: Mutex::new(Some(nickname.to_string())),
        }
    }
}

#[async_trait]
impl AccountRepository for InterleavedAccountRepository {
    async fn create(&self, account: &Account) -> Result<()> {
        self.inner.create(account).await
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Account>> {
        let snapshot = self.inner.find_by_name(name).await?;
        let pending = self.nickname.lock().unwrap().take();
        if let (Some(nickname), Some(stale)) = (pending, &snapshot) {
            let mut edited = stale.clone();
            edited.set_nickname(nickname)?;
            self.inner
                .update_unmodified_since(&edited, stale.updated_at())
                .await?;
        }
        Ok(snapshot)
    }

    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>> {
        self.inner.find_by_id(id).await
    }

    async fn find_many_by_id(&self, ids: &[AccountId]) -> Result<Vec<Account>> {
        self.inner.find_many_by_id(ids).await
    }

    async fn update(&self, account: &Account) -> Result<()> {
        self.inner.update(account).await
    }

    async fn update_unmodified_since(
        &self,
        account: &Account,
        observed: DateTime<Utc>,
    ) -> Result<()> {
        self.inner.update_unmodified_since(account, observed).await
    }
}
