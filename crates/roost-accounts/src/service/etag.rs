use roost_types::models::Account;
use sha2::{Digest, Sha256};

/// Derives the optimistic-concurrency tag of an account.
///
/// The tag is the hex SHA-256 of `"{nickname}:{mail}"`. It only tells a
/// client whether the profile moved since it was read; it grants nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct EtagService;

impl EtagService {
    pub fn new() -> Self {
        Self
    }

    pub fn generate(&self, account: &Account) -> String {
        let mut hasher = Sha256::new();
        hasher.update(account.nickname().as_bytes());
        hasher.update(b":");
        hasher.update(account.mail().as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn compare(&self, account: &Account, supplied: &str) -> bool {
        self.generate(account) == supplied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::account;

    #[test]
    fn tag_is_stable_sha256_hex() {
        let service = EtagService::new();
        let alice = account("alice");

        let tag = service.generate(&alice);
        assert_eq!(tag.len(), 64);
        assert!(tag.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(tag, service.generate(&alice.clone()));
        assert!(service.compare(&alice, &tag));
    }

    #[test]
    fn tag_matches_digest_of_nickname_and_mail() {
        let alice = account("alice");
        let expected = hex::encode(Sha256::digest(
            format!("{}:{}", alice.nickname(), alice.mail()).as_bytes(),
        ));
        assert_eq!(EtagService.generate(&alice), expected);
    }

    #[test]
    fn nickname_and_mail_change_the_tag() {
        let service = EtagService::new();
        let alice = account("alice");
        let tag = service.generate(&alice);

        let mut renamed = alice.clone();
        renamed.set_nickname("Alice B.").unwrap();
        assert_ne!(service.generate(&renamed), tag);

        let mut moved = alice.clone();
        moved.set_mail("alice@elsewhere.example").unwrap();
        assert_ne!(service.generate(&moved), tag);
    }

    #[test]
    fn bio_does_not_change_the_tag() {
        let service = EtagService::new();
        let mut alice = account("alice");
        let tag = service.generate(&alice);
        alice.set_bio("hello there").unwrap();
        assert!(service.compare(&alice, &tag));
    }

    #[test]
    fn tampered_tag_does_not_compare() {
        let service = EtagService::new();
        let alice = account("alice");
        let tag = service.generate(&alice) + "_invalid";
        assert!(!service.compare(&alice, &tag));
    }
}
