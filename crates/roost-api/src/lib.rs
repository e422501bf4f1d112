pub mod accounts;
pub mod error;
pub mod middleware;

use std::sync::Arc;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, patch, post, put},
};
use roost_accounts::controller::AccountController;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub controller: AccountController,
    pub jwt_secret: String,
}

/// All account routes. CORS and request tracing are layered on by the server.
///
/// `{account}` is an account id on the read routes (`GET /accounts/{account}`,
/// `/following`, `/follower`) and an account name everywhere else.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/accounts", post(accounts::create_account))
        .route("/accounts/login", post(accounts::login))
        .route("/accounts/by-name/{name}", get(accounts::get_account_by_name))
        .route("/accounts/{account}", get(accounts::get_account))
        .route("/accounts/{account}/following", get(accounts::fetch_following))
        .route("/accounts/{account}/follower", get(accounts::fetch_follower))
        .route("/accounts/{account}/verify_email", post(accounts::verify_email))
        .route(
            "/accounts/{account}/resend_verify_email",
            post(accounts::resend_verification_email),
        );

    let protected_routes = Router::new()
        .route("/accounts/{account}", patch(accounts::update_account))
        .route(
            "/accounts/{account}/freeze",
            put(accounts::freeze_account).delete(accounts::unfreeze_account),
        )
        .route(
            "/accounts/{account}/silence",
            put(accounts::silence_account).delete(accounts::unsilence_account),
        )
        .route(
            "/accounts/{account}/follow",
            put(accounts::follow_account).delete(accounts::unfollow_account),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
