mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use roost_accounts::controller::{AccountController, AccountControllerArgs};
use roost_accounts::passphrase::Argon2Hasher;
use roost_accounts::token::JwtTokenIssuer;
use roost_accounts::verification::LogMailer;
use roost_api::AppStateInner;
use roost_db::{Database, SqliteAccountRepository, SqliteFollowRepository, SqliteVerifyTokenRepository};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roost=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;
    if config.jwt_secret == "dev-secret-change-me" {
        warn!("ROOST_JWT_SECRET is not set; using the development secret");
    }

    // Init database
    let db = Arc::new(Database::open(&config.db_path)?);

    let controller = AccountController::new(AccountControllerArgs {
        accounts: Arc::new(SqliteAccountRepository::new(db.clone())),
        follows: Arc::new(SqliteFollowRepository::new(db.clone())),
        verify_tokens: Arc::new(SqliteVerifyTokenRepository::new(db)),
        hasher: Arc::new(Argon2Hasher),
        token_issuer: Arc::new(JwtTokenIssuer::new(
            config.jwt_secret.clone(),
            config.access_token_ttl,
            config.refresh_token_ttl,
        )),
        mailer: Arc::new(LogMailer),
        verify_token_ttl: config.verify_token_ttl,
    });

    let state = Arc::new(AppStateInner {
        controller,
        jwt_secret: config.jwt_secret.clone(),
    });

    let app = roost_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Roost server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
