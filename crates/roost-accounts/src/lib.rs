//! Account identity and follow graph: the services behind registration,
//! profile edits, authentication, moderation flags, mailbox verification
//! and following.
//!
//! Storage, token minting and mail delivery are reached only through the
//! traits in [`repository`], [`passphrase`], [`token`] and [`verification`],
//! so every service here can run against the in-memory repositories.

pub mod controller;
pub mod error;
pub mod passphrase;
pub mod repository;
pub mod service;
pub mod token;
pub mod verification;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{AccountError, Result};
