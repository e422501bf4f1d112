use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use roost_types::api::{Claims, TokenKind};
use roost_types::models::Account;

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub authorization_token: String,
    pub refresh_token: String,
}

/// Mints the access/refresh pair handed out on login.
pub trait TokenIssuer: Send + Sync {
    fn issue(&self, account: &Account) -> Result<TokenPair>;
}

/// HS256 JWTs signed with a shared secret.
pub struct JwtTokenIssuer {
    secret: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl JwtTokenIssuer {
    pub fn new(secret: impl Into<String>, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            access_ttl,
            refresh_ttl,
        }
    }

    fn sign(&self, account: &Account, kind: TokenKind, ttl: Duration) -> anyhow::Result<String> {
        let claims = Claims {
            sub: account.id(),
            name: account.name().to_string(),
            kind,
            exp: (Utc::now() + ttl).timestamp() as usize,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?;

        Ok(token)
    }
}

impl TokenIssuer for JwtTokenIssuer {
    fn issue(&self, account: &Account) -> Result<TokenPair> {
        Ok(TokenPair {
            authorization_token: self.sign(account, TokenKind::Access, self.access_ttl)?,
            refresh_token: self.sign(account, TokenKind::Refresh, self.refresh_ttl)?,
        })
    }
}

/// Validate signature and expiry of a token minted by [`JwtTokenIssuer`].
pub fn decode_claims(secret: &str, token: &str) -> anyhow::Result<Claims> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}
