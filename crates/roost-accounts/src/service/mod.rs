//! One service per use case. Services share repository and collaborator
//! contracts, never each other.

pub mod authenticate;
pub mod edit;
pub mod etag;
pub mod fetch;
pub mod fetch_follow;
pub mod follow;
pub mod freeze;
pub mod register;
pub mod resend_token;
pub mod silence;
pub mod unfollow;
pub mod verify_token;

pub use authenticate::AuthenticateService;
pub use edit::{AccountEdit, EditService};
pub use etag::EtagService;
pub use fetch::FetchService;
pub use fetch_follow::FetchFollowService;
pub use follow::FollowService;
pub use freeze::FreezeService;
pub use register::RegisterService;
pub use resend_token::ResendVerifyTokenService;
pub use silence::SilenceService;
pub use unfollow::UnfollowService;
pub use verify_token::VerifyAccountTokenService;
