//! Database row types. These map directly to SQLite rows and stay separate
//! from the roost-types entities so the schema can move on its own.

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use roost_types::models::{Account, AccountArgs, AccountFollow, VerifyToken};

pub struct AccountRow {
    pub id: String,
    pub name: String,
    pub mail: String,
    pub nickname: String,
    pub passphrase_hash: String,
    pub bio: String,
    pub role: String,
    pub frozen: String,
    pub silenced: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
    pub deleted_at: Option<String>,
}

pub struct FollowRow {
    pub from_id: String,
    pub target_id: String,
    pub created_at: String,
}

pub struct VerifyTokenRow {
    pub account_id: String,
    pub token: String,
    pub expires_at: String,
}

/// Fixed-width RFC 3339 with nanoseconds, so string order is time order and
/// `updated_at` survives a round trip exactly.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc))
}

impl From<&Account> for AccountRow {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id().to_string(),
            name: account.name().to_string(),
            mail: account.mail().to_string(),
            nickname: account.nickname().to_string(),
            passphrase_hash: account.passphrase_hash().to_string(),
            bio: account.bio().to_string(),
            role: account.role().as_str().to_string(),
            frozen: account.frozen().as_str().to_string(),
            silenced: account.silenced().as_str().to_string(),
            status: account.status().as_str().to_string(),
            created_at: format_timestamp(account.created_at()),
            updated_at: format_timestamp(account.updated_at()),
            deleted_at: account.deleted_at().map(format_timestamp),
        }
    }
}

impl TryFrom<AccountRow> for Account {
    type Error = anyhow::Error;

    fn try_from(row: AccountRow) -> Result<Self> {
        Ok(Account::new(AccountArgs {
            id: row.id.parse()?,
            name: row.name,
            mail: row.mail,
            nickname: row.nickname,
            passphrase_hash: row.passphrase_hash,
            bio: row.bio,
            role: row.role.parse()?,
            frozen: row.frozen.parse()?,
            silenced: row.silenced.parse()?,
            status: row.status.parse()?,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
            deleted_at: row.deleted_at.as_deref().map(parse_timestamp).transpose()?,
        }))
    }
}

impl TryFrom<FollowRow> for AccountFollow {
    type Error = anyhow::Error;

    fn try_from(row: FollowRow) -> Result<Self> {
        Ok(AccountFollow::new(
            row.from_id.parse()?,
            row.target_id.parse()?,
            parse_timestamp(&row.created_at)?,
        )?)
    }
}

impl From<&VerifyToken> for VerifyTokenRow {
    fn from(token: &VerifyToken) -> Self {
        Self {
            account_id: token.account_id.to_string(),
            token: token.token.clone(),
            expires_at: format_timestamp(token.expires_at),
        }
    }
}

impl TryFrom<VerifyTokenRow> for VerifyToken {
    type Error = anyhow::Error;

    fn try_from(row: VerifyTokenRow) -> Result<Self> {
        Ok(VerifyToken {
            account_id: row.account_id.parse()?,
            token: row.token,
            expires_at: parse_timestamp(&row.expires_at)?,
        })
    }
}
