use std::sync::Arc;

use chrono::Duration;
use roost_types::api::{
    AccountResponse, CreateAccountResponse, LoginResponse, UpdateAccountRequest,
    UpdateAccountResponse,
};
use roost_types::models::{Account, AccountId, Role};

use crate::error::Result;
use crate::passphrase::PassphraseHasher;
use crate::repository::{AccountRepository, FollowRepository, VerifyTokenRepository};
use crate::service::{
    AccountEdit, AuthenticateService, EditService, EtagService, FetchFollowService, FetchService,
    FollowService, FreezeService, RegisterService, ResendVerifyTokenService, SilenceService,
    UnfollowService, VerifyAccountTokenService,
};
use crate::token::TokenIssuer;
use crate::verification::{VerificationMailer, VerifyTokenIssuer};

/// A response body together with the etag of the account it describes.
#[derive(Debug)]
pub struct Etagged<T> {
    pub etag: String,
    pub body: T,
}

/// Everything the controller needs from the outside world.
pub struct AccountControllerArgs {
    pub accounts: Arc<dyn AccountRepository>,
    pub follows: Arc<dyn FollowRepository>,
    pub verify_tokens: Arc<dyn VerifyTokenRepository>,
    pub hasher: Arc<dyn PassphraseHasher>,
    pub token_issuer: Arc<dyn TokenIssuer>,
    pub mailer: Arc<dyn VerificationMailer>,
    pub verify_token_ttl: Duration,
}

/// Request/response boundary over the account services. Transport
/// adapters call this and map [`crate::AccountError`] to their own outcomes.
pub struct AccountController {
    register: RegisterService,
    edit: EditService,
    fetch: FetchService,
    freeze: FreezeService,
    verify_token: VerifyAccountTokenService,
    authenticate: AuthenticateService,
    silence: SilenceService,
    follow: FollowService,
    unfollow: UnfollowService,
    fetch_follow: FetchFollowService,
    resend_token: ResendVerifyTokenService,
    etag: EtagService,
}

impl AccountController {
    pub fn new(args: AccountControllerArgs) -> Self {
        let issuer = Arc::new(VerifyTokenIssuer::new(
            args.verify_tokens.clone(),
            args.mailer,
            args.verify_token_ttl,
        ));

        Self {
            register: RegisterService::new(args.accounts.clone(), args.hasher.clone(), issuer.clone()),
            edit: EditService::new(args.accounts.clone(), args.hasher.clone()),
            fetch: FetchService::new(args.accounts.clone()),
            freeze: FreezeService::new(args.accounts.clone()),
            verify_token: VerifyAccountTokenService::new(args.accounts.clone(), args.verify_tokens),
            authenticate: AuthenticateService::new(args.accounts.clone(), args.hasher, args.token_issuer),
            silence: SilenceService::new(args.accounts.clone()),
            follow: FollowService::new(args.accounts.clone(), args.follows.clone()),
            unfollow: UnfollowService::new(args.accounts.clone(), args.follows.clone()),
            fetch_follow: FetchFollowService::new(args.follows),
            resend_token: ResendVerifyTokenService::new(args.accounts, issuer),
            etag: EtagService::new(),
        }
    }

    pub async fn create_account(
        &self,
        name: &str,
        email: &str,
        passphrase: &str,
    ) -> Result<CreateAccountResponse> {
        let account = self
            .register
            .handle(name, email, "", passphrase, Role::Normal)
            .await?;

        Ok(CreateAccountResponse {
            id: account.id(),
            name: account.name().to_string(),
            email: account.mail().to_string(),
        })
    }

    pub async fn get_account(&self, id: AccountId) -> Result<Etagged<AccountResponse>> {
        let account = self.fetch.fetch_account_by_id(id).await?;
        Ok(self.tagged(&account, AccountResponse::from(&account)))
    }

    pub async fn get_account_by_name(&self, name: &str) -> Result<Etagged<AccountResponse>> {
        let account = self.fetch.fetch_account(name).await?;
        Ok(self.tagged(&account, AccountResponse::from(&account)))
    }

    /// Apply every requested change against the single observed `etag`.
    /// Empty optional fields are left alone; `bio` is always written.
    pub async fn update_account(
        &self,
        name: &str,
        req: UpdateAccountRequest,
        etag: &str,
    ) -> Result<Etagged<UpdateAccountResponse>> {
        let edit = AccountEdit {
            nickname: req.nickname.filter(|v| !v.is_empty()),
            mail: req.email.filter(|v| !v.is_empty()),
            passphrase: req.passphrase.filter(|v| !v.is_empty()),
            bio: Some(req.bio),
        };

        let account = self.edit.edit(etag, name, edit).await?;
        Ok(self.tagged(&account, UpdateAccountResponse::from(&account)))
    }

    pub async fn freeze_account(&self, name: &str) -> Result<()> {
        self.freeze.set_freeze(name).await
    }

    pub async fn unfreeze_account(&self, name: &str) -> Result<()> {
        self.freeze.undo_freeze(name).await
    }

    pub async fn verify_email(&self, name: &str, token: &str) -> Result<()> {
        self.verify_token.verify(name, token).await
    }

    pub async fn login(&self, name: &str, passphrase: &str) -> Result<LoginResponse> {
        let pair = self.authenticate.handle(name, passphrase).await?;
        Ok(LoginResponse {
            authorization_token: pair.authorization_token,
            refresh_token: pair.refresh_token,
        })
    }

    // TODO: restrict silence/freeze to moderator and admin roles once the
    // caller's account is passed in.
    pub async fn silence_account(&self, name: &str) -> Result<()> {
        self.silence.set_silence(name).await
    }

    pub async fn unsilence_account(&self, name: &str) -> Result<()> {
        self.silence.undo_silence(name).await
    }

    pub async fn follow_account(&self, from_name: &str, target_name: &str) -> Result<()> {
        self.follow.handle(from_name, target_name).await
    }

    pub async fn unfollow_account(&self, from_name: &str, target_name: &str) -> Result<()> {
        self.unfollow.handle(from_name, target_name).await
    }

    pub async fn resend_verification_email(&self, name: &str) -> Result<()> {
        self.resend_token.handle(name).await
    }

    /// Accounts `id` follows, oldest edge first. Edges pointing at accounts
    /// that no longer exist are dropped.
    pub async fn fetch_following(&self, id: AccountId) -> Result<Vec<AccountResponse>> {
        let targets: Vec<AccountId> = self
            .fetch_follow
            .fetch_followings_by_id(id)
            .await?
            .iter()
            .map(|f| f.target_id())
            .collect();

        self.resolve(&targets).await
    }

    /// Accounts following `id`, oldest edge first.
    pub async fn fetch_follower(&self, id: AccountId) -> Result<Vec<AccountResponse>> {
        let sources: Vec<AccountId> = self
            .fetch_follow
            .fetch_followers_by_id(id)
            .await?
            .iter()
            .map(|f| f.from_id())
            .collect();

        self.resolve(&sources).await
    }

    async fn resolve(&self, ids: &[AccountId]) -> Result<Vec<AccountResponse>> {
        let accounts = self.fetch.fetch_many_accounts_by_id(ids).await?;
        Ok(accounts.iter().map(AccountResponse::from).collect())
    }

    fn tagged<T>(&self, account: &Account, body: T) -> Etagged<T> {
        Etagged {
            etag: self.etag.generate(account),
            body,
        }
    }
}
