use roost_types::models::ModelError;
use thiserror::Error;

pub type Result<T, E = AccountError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("account name already taken: {0}")]
    AlreadyExists(String),

    /// The supplied etag no longer matches the stored account.
    #[error("account was modified since it was fetched")]
    Conflict,

    #[error("invalid credential")]
    InvalidCredential,

    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("verification token expired")]
    Expired,

    #[error("verification token mismatch")]
    TokenMismatch,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<ModelError> for AccountError {
    fn from(err: ModelError) -> Self {
        Self::InvalidOperation(err.to_string())
    }
}
