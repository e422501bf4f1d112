use std::sync::Arc;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{Duration, Utc};
use rand::RngCore;
use roost_types::models::{Account, VerifyToken};
use tracing::info;

use crate::error::Result;
use crate::repository::VerifyTokenRepository;

const TOKEN_BYTES: usize = 32;

/// Default lifetime of a verification token, in hours.
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 7 * 24;

/// Delivers a verification token to the account's mailbox.
#[async_trait]
pub trait VerificationMailer: Send + Sync {
    async fn send(&self, account: &Account, token: &VerifyToken) -> Result<()>;
}

/// Writes the token to the log instead of sending mail. Enough for
/// development servers where nobody runs an MTA.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl VerificationMailer for LogMailer {
    async fn send(&self, account: &Account, token: &VerifyToken) -> Result<()> {
        info!(
            "Verification token for {} <{}>: {} (expires {})",
            account.name(),
            account.mail(),
            token.token,
            token.expires_at
        );
        Ok(())
    }
}

/// Generates, stores and mails verification tokens. Shared by registration
/// and resend so both follow the same one-live-token rule.
pub struct VerifyTokenIssuer {
    tokens: Arc<dyn VerifyTokenRepository>,
    mailer: Arc<dyn VerificationMailer>,
    ttl: Duration,
}

impl VerifyTokenIssuer {
    pub fn new(
        tokens: Arc<dyn VerifyTokenRepository>,
        mailer: Arc<dyn VerificationMailer>,
        ttl: Duration,
    ) -> Self {
        Self { tokens, mailer, ttl }
    }

    /// Replace the account's live token with a fresh one and mail it.
    pub async fn issue(&self, account: &Account) -> Result<VerifyToken> {
        let token = VerifyToken {
            account_id: account.id(),
            token: generate_secret(),
            expires_at: Utc::now() + self.ttl,
        };

        self.tokens.create(&token).await?;
        self.mailer.send(account, &token).await?;
        Ok(token)
    }
}

fn generate_secret() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
