use anyhow::anyhow;
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};

use crate::error::Result;

/// One-way passphrase hashing. Only the resulting hash is ever stored.
pub trait PassphraseHasher: Send + Sync {
    fn hash(&self, passphrase: &str) -> Result<String>;

    /// `Ok(false)` on a wrong passphrase; `Err` only when `hash` is unusable.
    fn verify(&self, passphrase: &str, hash: &str) -> Result<bool>;
}

/// Argon2id with the crate's default parameters and a random salt per hash.
#[derive(Debug, Default, Clone, Copy)]
pub struct Argon2Hasher;

impl PassphraseHasher for Argon2Hasher {
    fn hash(&self, passphrase: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(passphrase.as_bytes(), &salt)
            .map_err(|e| anyhow!("failed to hash passphrase: {}", e))?
            .to_string();
        Ok(hash)
    }

    fn verify(&self, passphrase: &str, hash: &str) -> Result<bool> {
        let parsed =
            PasswordHash::new(hash).map_err(|e| anyhow!("stored passphrase hash is invalid: {}", e))?;
        Ok(Argon2::default()
            .verify_password(passphrase.as_bytes(), &parsed)
            .is_ok())
    }
}
