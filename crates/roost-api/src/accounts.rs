use axum::{
    Extension, Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use roost_types::api::{
    Claims, CreateAccountRequest, LoginRequest, UpdateAccountRequest, VerifyEmailRequest,
};
use roost_types::models::AccountId;

use crate::AppState;
use crate::error::status_for;

fn quoted(etag: &str) -> String {
    format!("\"{}\"", etag)
}

/// The tag from an `If-Match` header, without its quotes.
fn if_match(headers: &HeaderMap) -> Option<&str> {
    let raw = headers.get(header::IF_MATCH)?.to_str().ok()?.trim();
    Some(raw.trim_matches('"'))
}

pub async fn create_account(
    State(state): State<AppState>,
    Json(req): Json<CreateAccountRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    if req.name.is_empty() || req.email.is_empty() || req.passphrase.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let created = state
        .controller
        .create_account(&req.name, &req.email, &req.passphrase)
        .await
        .map_err(status_for)?;

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let tokens = state
        .controller
        .login(&req.name, &req.passphrase)
        .await
        .map_err(status_for)?;

    Ok(Json(tokens))
}

pub async fn get_account(
    State(state): State<AppState>,
    Path(id): Path<AccountId>,
) -> Result<impl IntoResponse, StatusCode> {
    let tagged = state.controller.get_account(id).await.map_err(status_for)?;
    Ok(([(header::ETAG, quoted(&tagged.etag))], Json(tagged.body)))
}

pub async fn get_account_by_name(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, StatusCode> {
    let tagged = state
        .controller
        .get_account_by_name(&name)
        .await
        .map_err(status_for)?;
    Ok(([(header::ETAG, quoted(&tagged.etag))], Json(tagged.body)))
}

/// Only the account itself may edit its profile, and it must echo the
/// etag it last saw in `If-Match`.
pub async fn update_account(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
    Json(req): Json<UpdateAccountRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    if claims.name != name {
        return Err(StatusCode::FORBIDDEN);
    }
    let etag = if_match(&headers).ok_or(StatusCode::PRECONDITION_REQUIRED)?;

    let tagged = state
        .controller
        .update_account(&name, req, etag)
        .await
        .map_err(status_for)?;
    Ok(([(header::ETAG, quoted(&tagged.etag))], Json(tagged.body)))
}

pub async fn freeze_account(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<StatusCode, StatusCode> {
    state.controller.freeze_account(&name).await.map_err(status_for)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn unfreeze_account(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<StatusCode, StatusCode> {
    state.controller.unfreeze_account(&name).await.map_err(status_for)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn silence_account(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<StatusCode, StatusCode> {
    state.controller.silence_account(&name).await.map_err(status_for)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn unsilence_account(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<StatusCode, StatusCode> {
    state.controller.unsilence_account(&name).await.map_err(status_for)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn verify_email(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(req): Json<VerifyEmailRequest>,
) -> Result<StatusCode, StatusCode> {
    state
        .controller
        .verify_email(&name, &req.token)
        .await
        .map_err(status_for)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn resend_verification_email(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<StatusCode, StatusCode> {
    state
        .controller
        .resend_verification_email(&name)
        .await
        .map_err(status_for)?;
    Ok(StatusCode::NO_CONTENT)
}

/// The caller (token subject) follows `target`.
pub async fn follow_account(
    State(state): State<AppState>,
    Path(target): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<StatusCode, StatusCode> {
    state
        .controller
        .follow_account(&claims.name, &target)
        .await
        .map_err(status_for)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn unfollow_account(
    State(state): State<AppState>,
    Path(target): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<StatusCode, StatusCode> {
    state
        .controller
        .unfollow_account(&claims.name, &target)
        .await
        .map_err(status_for)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn fetch_following(
    State(state): State<AppState>,
    Path(id): Path<AccountId>,
) -> Result<impl IntoResponse, StatusCode> {
    let accounts = state.controller.fetch_following(id).await.map_err(status_for)?;
    Ok(Json(accounts))
}

pub async fn fetch_follower(
    State(state): State<AppState>,
    Path(id): Path<AccountId>,
) -> Result<impl IntoResponse, StatusCode> {
    let accounts = state.controller.fetch_follower(id).await.map_err(status_for)?;
    Ok(Json(accounts))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{Router, body::Body, http::Request};
    use chrono::Duration;
    use roost_accounts::controller::{AccountController, AccountControllerArgs};
    use roost_accounts::passphrase::Argon2Hasher;
    use roost_accounts::repository::{
        InMemoryAccountRepository, InMemoryFollowRepository, InMemoryVerifyTokenRepository,
    };
    use roost_accounts::token::JwtTokenIssuer;
    use roost_accounts::verification::LogMailer;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::{AppStateInner, router};

    const SECRET: &str = "api-test-secret";

    fn app() -> Router {
        let controller = AccountController::new(AccountControllerArgs {
            accounts: Arc::new(InMemoryAccountRepository::new()),
            follows: Arc::new(InMemoryFollowRepository::new()),
            verify_tokens: Arc::new(InMemoryVerifyTokenRepository::new()),
            hasher: Arc::new(Argon2Hasher),
            token_issuer: Arc::new(JwtTokenIssuer::new(
                SECRET,
                Duration::hours(1),
                Duration::days(30),
            )),
            mailer: Arc::new(LogMailer),
            verify_token_ttl: Duration::hours(1),
        });
        router(Arc::new(AppStateInner {
            controller,
            jwt_secret: SECRET.to_string(),
        }))
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        headers: &[(&str, &str)],
        body: Option<Value>,
    ) -> (StatusCode, HeaderMap, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        for (k, v) in headers {
            builder = builder.header(*k, *v);
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let resp = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, headers, json)
    }

    async fn register_and_login(app: &Router, name: &str) -> (String, String) {
        let (status, _, created) = send(
            app,
            "POST",
            "/accounts",
            &[],
            Some(json!({ "name": name, "email": format!("{}@example.com", name), "passphrase": "pw123" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, _, tokens) = send(
            app,
            "POST",
            "/accounts/login",
            &[],
            Some(json!({ "name": name, "passphrase": "pw123" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        (
            created["id"].as_str().unwrap().to_string(),
            format!("Bearer {}", tokens["authorization_token"].as_str().unwrap()),
        )
    }

    #[tokio::test]
    async fn profile_update_requires_the_current_etag() {
        let app = app();
        let (id, bearer) = register_and_login(&app, "alice").await;

        let (status, headers, body) = send(&app, "GET", &format!("/accounts/{}", id), &[], None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "notActivated");
        let etag = headers[header::ETAG].to_str().unwrap().to_string();

        let update = json!({ "nickname": "Alice", "bio": "hello" });
        let (status, _, _) = send(&app, "PATCH", "/accounts/alice", &[], Some(update.clone())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let auth = [("authorization", bearer.as_str())];
        let (status, _, _) = send(&app, "PATCH", "/accounts/alice", &auth, Some(update.clone())).await;
        assert_eq!(status, StatusCode::PRECONDITION_REQUIRED);

        let with_tag = [("authorization", bearer.as_str()), ("if-match", etag.as_str())];
        let (status, headers, body) =
            send(&app, "PATCH", "/accounts/alice", &with_tag, Some(update.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["nickname"], "Alice");
        assert_ne!(headers[header::ETAG].to_str().unwrap(), etag);

        let (status, _, _) = send(&app, "PATCH", "/accounts/alice", &with_tag, Some(update)).await;
        assert_eq!(status, StatusCode::PRECONDITION_FAILED);
    }

    #[tokio::test]
    async fn follow_through_http() {
        let app = app();
        let (alice_id, bearer) = register_and_login(&app, "alice").await;
        register_and_login(&app, "bob").await;
        let auth = [("authorization", bearer.as_str())];

        let (status, _, _) = send(&app, "PUT", "/accounts/bob/follow", &auth, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _, _) = send(&app, "PUT", "/accounts/alice/follow", &auth, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _, body) =
            send(&app, "GET", &format!("/accounts/{}/following", alice_id), &[], None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["name"], "bob");

        let (status, _, _) = send(&app, "DELETE", "/accounts/bob/follow", &auth, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, _, body) =
            send(&app, "GET", &format!("/accounts/{}/following", alice_id), &[], None).await;
        assert!(body.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn bad_verification_token_is_not_found() {
        let app = app();
        register_and_login(&app, "alice").await;

        let (status, _, _) = send(
            &app,
            "POST",
            "/accounts/alice/verify_email",
            &[],
            Some(json!({ "token": "guess" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _, _) = send(&app, "POST", "/accounts/nobody/resend_verify_email", &[], None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts() {
        let app = app();
        register_and_login(&app, "alice").await;
        let (status, _, _) = send(
            &app,
            "POST",
            "/accounts",
            &[],
            Some(json!({ "name": "alice", "email": "x@example.com", "passphrase": "pw" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _, _) = send(
            &app,
            "POST",
            "/accounts/login",
            &[],
            Some(json!({ "name": "alice", "passphrase": "nope" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
