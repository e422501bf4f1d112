use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Account, AccountId, AccountStatus, FrozenState, Role, SilencedState};

// -- JWT Claims --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims shared by the token issuer (roost-accounts) and the
/// REST auth middleware (roost-api).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: AccountId,
    pub name: String,
    pub kind: TokenKind,
    pub exp: usize,
}

// -- Accounts --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateAccountRequest {
    pub name: String,
    pub email: String,
    pub passphrase: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateAccountResponse {
    pub id: AccountId,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateAccountRequest {
    pub nickname: Option<String>,
    pub email: Option<String>,
    pub passphrase: Option<String>,
    pub bio: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateAccountResponse {
    pub id: AccountId,
    pub email: String,
    pub name: String,
    pub nickname: String,
    pub bio: String,
}

impl From<&Account> for UpdateAccountResponse {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id(),
            email: account.mail().to_string(),
            name: account.name().to_string(),
            nickname: account.nickname().to_string(),
            bio: account.bio().to_string(),
        }
    }
}

/// Public view of an account. Avatar, header and the counters are not
/// tracked yet and are always empty / zero.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccountResponse {
    pub id: AccountId,
    pub email: String,
    pub name: String,
    pub nickname: String,
    pub bio: String,
    pub avatar: String,
    pub header: String,
    pub followed_count: u64,
    pub following_count: u64,
    pub note_count: u64,
    pub created_at: DateTime<Utc>,
    pub role: Role,
    pub frozen: FrozenState,
    pub status: AccountStatus,
    pub silenced: SilencedState,
}

impl From<&Account> for AccountResponse {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id(),
            email: account.mail().to_string(),
            name: account.name().to_string(),
            nickname: account.nickname().to_string(),
            bio: account.bio().to_string(),
            avatar: String::new(),
            header: String::new(),
            followed_count: 0,
            following_count: 0,
            note_count: 0,
            created_at: account.created_at(),
            role: account.role(),
            frozen: account.frozen(),
            status: account.status(),
            silenced: account.silenced(),
        }
    }
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub name: String,
    pub passphrase: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub authorization_token: String,
    pub refresh_token: String,
}

// -- Verification --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerifyEmailRequest {
    pub token: String,
}
