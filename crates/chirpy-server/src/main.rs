mod config;

use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use chirpy_api::auth::TokenService;
use chirpy_api::{AppStateInner, build_router};
use chirpy_db::Database;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "chirpy=debug,chirpy_api=debug,chirpy_db=debug,tower_http=debug".into()
            }),
        )
        .init();

    let config = Config::from_env()?;
    if config.polka_key.is_empty() {
        warn!("CHIRPY_POLKA_KEY is not set; all webhooks will be rejected");
    }

    // A store that cannot be initialized is the one fatal error.
    let db = Database::open(&config.db_path)?;

    let state = AppStateInner::new(
        db,
        TokenService::new(&config.jwt_secret),
        config.polka_key.clone(),
    );

    let app = build_router(state, &config.static_dir).layer(TraceLayer::new_for_http());

    let addr = config.bind_addr()?;
    info!("Chirpy server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
