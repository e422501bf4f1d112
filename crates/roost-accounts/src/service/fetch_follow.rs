use std::sync::Arc;

use roost_types::models::{AccountFollow, AccountId};

use crate::error::Result;
use crate::repository::FollowRepository;

/// Raw follow edges of an account. Resolving the other end into accounts is
/// left to the caller.
pub struct FetchFollowService {
    follows: Arc<dyn FollowRepository>,
}

impl FetchFollowService {
    pub fn new(follows: Arc<dyn FollowRepository>) -> Self {
        Self { follows }
    }

    pub async fn fetch_followings_by_id(&self, id: AccountId) -> Result<Vec<AccountFollow>> {
        self.follows.find_followings(id).await
    }

    pub async fn fetch_followers_by_id(&self, id: AccountId) -> Result<Vec<AccountFollow>> {
        self.follows.find_followers(id).await
    }
}
