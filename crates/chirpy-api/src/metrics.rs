use std::sync::atomic::{AtomicU64, Ordering};

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{Html, Response},
};
use tracing::info;

use crate::state::AppState;

/// Counts requests served from the static file tree.
#[derive(Debug, Default)]
pub struct Metrics {
    fileserver_hits: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) -> u64 {
        self.fileserver_hits.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn hits(&self) -> u64 {
        self.fileserver_hits.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.fileserver_hits.store(0, Ordering::Relaxed);
    }
}

/// Middleware: bump the hit counter, then serve.
pub async fn count_hits(State(state): State<AppState>, req: Request, next: Next) -> Response {
    state.metrics.record_hit();
    next.run(req).await
}

pub async fn metrics_page(State(state): State<AppState>) -> Html<String> {
    Html(format!(
        "<html><body><h1>Welcome, Chirpy Admin</h1><p>Chirpy has been visited {} times!</p></body></html>",
        state.metrics.hits()
    ))
}

pub async fn reset(State(state): State<AppState>) -> String {
    state.metrics.reset();
    info!("hit counter reset");
    format!("Hits: {}", state.metrics.hits())
}
