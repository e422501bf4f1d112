use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Invariant violations raised by the entity types themselves.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("account {0} is deleted")]
    AccountDeleted(AccountId),

    #[error("cannot move account status from {from} to {to}")]
    InvalidStatusTransition {
        from: AccountStatus,
        to: AccountStatus,
    },

    #[error("account {0} cannot follow itself")]
    SelfFollow(AccountId),

    #[error("unknown {kind} value: {value}")]
    UnknownVariant { kind: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(Uuid);

impl AccountId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for AccountId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

/// Declares a flag-like enum stored as a camelCase string both on the wire
/// and in the database.
macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "camelCase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(ModelError::UnknownVariant {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

string_enum!(Role, "role", {
    Normal => "normal",
    Moderator => "moderator",
    Admin => "admin",
});

string_enum!(FrozenState, "frozen", {
    Normal => "normal",
    Frozen => "frozen",
});

string_enum!(SilencedState, "silenced", {
    Normal => "normal",
    Silenced => "silenced",
});

string_enum!(
    /// Lifecycle of an account. Only ever moves forward:
    /// `notActivated -> active -> deleted`.
    AccountStatus, "status", {
        NotActivated => "notActivated",
        Active => "active",
        Deleted => "deleted",
    }
);

impl AccountStatus {
    fn rank(&self) -> u8 {
        match self {
            Self::NotActivated => 0,
            Self::Active => 1,
            Self::Deleted => 2,
        }
    }
}

/// Every field of an [`Account`], used to rebuild one from storage.
#[derive(Debug, Clone)]
pub struct AccountArgs {
    pub id: AccountId,
    pub name: String,
    pub mail: String,
    pub nickname: String,
    pub passphrase_hash: String,
    pub bio: String,
    pub role: Role,
    pub frozen: FrozenState,
    pub silenced: SilencedState,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Identity record.
///
/// Fields are private so the invariants hold: `id` and `name` never change,
/// the status only moves forward, and every mutation bumps `updated_at`.
/// Not `Serialize`: the passphrase hash must never leave the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    id: AccountId,
    name: String,
    mail: String,
    nickname: String,
    passphrase_hash: String,
    bio: String,
    role: Role,
    frozen: FrozenState,
    silenced: SilencedState,
    status: AccountStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl Account {
    pub fn new(args: AccountArgs) -> Self {
        Self {
            id: args.id,
            name: args.name,
            mail: args.mail,
            nickname: args.nickname,
            passphrase_hash: args.passphrase_hash,
            bio: args.bio,
            role: args.role,
            frozen: args.frozen,
            silenced: args.silenced,
            status: args.status,
            created_at: args.created_at,
            updated_at: args.updated_at,
            deleted_at: args.deleted_at,
        }
    }

    /// A freshly registered account: not activated, empty bio, no moderation flags.
    pub fn register(
        id: AccountId,
        name: impl Into<String>,
        mail: impl Into<String>,
        nickname: impl Into<String>,
        passphrase_hash: impl Into<String>,
        role: Role,
    ) -> Self {
        let now = Utc::now();
        Self::new(AccountArgs {
            id,
            name: name.into(),
            mail: mail.into(),
            nickname: nickname.into(),
            passphrase_hash: passphrase_hash.into(),
            bio: String::new(),
            role,
            frozen: FrozenState::Normal,
            silenced: SilencedState::Normal,
            status: AccountStatus::NotActivated,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        })
    }

    pub fn id(&self) -> AccountId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mail(&self) -> &str {
        &self.mail
    }

    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    pub fn passphrase_hash(&self) -> &str {
        &self.passphrase_hash
    }

    pub fn bio(&self) -> &str {
        &self.bio
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn frozen(&self) -> FrozenState {
        self.frozen
    }

    pub fn silenced(&self) -> SilencedState {
        self.silenced
    }

    pub fn status(&self) -> AccountStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    pub fn is_deleted(&self) -> bool {
        self.status == AccountStatus::Deleted
    }

    pub fn set_nickname(&mut self, nickname: impl Into<String>) -> Result<(), ModelError> {
        self.ensure_not_deleted()?;
        self.nickname = nickname.into();
        self.touch();
        Ok(())
    }

    pub fn set_mail(&mut self, mail: impl Into<String>) -> Result<(), ModelError> {
        self.ensure_not_deleted()?;
        self.mail = mail.into();
        self.touch();
        Ok(())
    }

    pub fn set_passphrase_hash(&mut self, hash: impl Into<String>) -> Result<(), ModelError> {
        self.ensure_not_deleted()?;
        self.passphrase_hash = hash.into();
        self.touch();
        Ok(())
    }

    pub fn set_bio(&mut self, bio: impl Into<String>) -> Result<(), ModelError> {
        self.ensure_not_deleted()?;
        self.bio = bio.into();
        self.touch();
        Ok(())
    }

    pub fn set_frozen(&mut self, frozen: FrozenState) -> Result<(), ModelError> {
        self.ensure_not_deleted()?;
        self.frozen = frozen;
        self.touch();
        Ok(())
    }

    pub fn set_silenced(&mut self, silenced: SilencedState) -> Result<(), ModelError> {
        self.ensure_not_deleted()?;
        self.silenced = silenced;
        self.touch();
        Ok(())
    }

    pub fn activate(&mut self) -> Result<(), ModelError> {
        self.transition(AccountStatus::Active)
    }

    /// Soft delete. The record stays, the status becomes `deleted` for good.
    pub fn delete(&mut self) -> Result<(), ModelError> {
        self.transition(AccountStatus::Deleted)?;
        self.deleted_at = Some(self.updated_at);
        Ok(())
    }

    fn transition(&mut self, to: AccountStatus) -> Result<(), ModelError> {
        if to.rank() <= self.status.rank() {
            return Err(ModelError::InvalidStatusTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        self.touch();
        Ok(())
    }

    fn ensure_not_deleted(&self) -> Result<(), ModelError> {
        if self.is_deleted() {
            return Err(ModelError::AccountDeleted(self.id));
        }
        Ok(())
    }

    fn touch(&mut self) {
        let now = Utc::now();
        // Conditional writes compare on updated_at, so it must strictly advance.
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + chrono::Duration::nanoseconds(1)
        };
    }
}

/// Directed follow edge: `from_id` follows `target_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountFollow {
    from_id: AccountId,
    target_id: AccountId,
    created_at: DateTime<Utc>,
}

impl AccountFollow {
    pub fn new(
        from_id: AccountId,
        target_id: AccountId,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ModelError> {
        if from_id == target_id {
            return Err(ModelError::SelfFollow(from_id));
        }
        Ok(Self {
            from_id,
            target_id,
            created_at,
        })
    }

    pub fn from_id(&self) -> AccountId {
        self.from_id
    }

    pub fn target_id(&self) -> AccountId {
        self.target_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Single-use mailbox verification secret. At most one is live per account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyToken {
    pub account_id: AccountId,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl VerifyToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
