use std::path::Path;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::services::ServeDir;

use crate::state::AppState;
use crate::{auth, chirps, metrics, users, webhooks};

/// Assemble the full HTTP surface. `static_dir` is served under `/app`.
pub fn build_router(state: AppState, static_dir: &Path) -> Router {
    let app_files = Router::new()
        .nest_service("/app", ServeDir::new(static_dir))
        .layer(middleware::from_fn_with_state(state.clone(), metrics::count_hits));

    let api = Router::new()
        .route("/healthz", get(healthz))
        .route("/reset", post(metrics::reset))
        .route("/users", post(users::create_user).put(users::update_user))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/revoke", post(auth::revoke))
        .route("/chirps", get(chirps::list_chirps).post(chirps::create_chirp))
        .route(
            "/chirps/{chirp_id}",
            get(chirps::get_chirp).delete(chirps::delete_chirp),
        )
        .route("/polka/webhooks", post(webhooks::polka_webhook));

    let admin = Router::new().route("/metrics", get(metrics::metrics_page));

    Router::new()
        .merge(app_files)
        .nest("/api", api)
        .nest("/admin", admin)
        .with_state(state)
}

async fn healthz() -> &'static str {
    "OK"
}
