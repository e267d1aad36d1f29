use std::sync::Arc;

use tracing::error;

use chirpy_db::Database;

use crate::auth::TokenService;
use crate::error::ApiError;
use crate::metrics::Metrics;

pub type AppState = Arc<AppStateInner>;

/// Process-wide server context shared by every handler.
pub struct AppStateInner {
    pub db: Database,
    pub tokens: TokenService,
    pub metrics: Metrics,
    /// Key the payment provider presents on webhook calls. Empty rejects all.
    pub polka_key: String,
}

impl AppStateInner {
    pub fn new(db: Database, tokens: TokenService, polka_key: String) -> AppState {
        Arc::new(Self {
            db,
            tokens,
            metrics: Metrics::new(),
            polka_key,
        })
    }
}

/// Run a blocking store call off the async runtime.
pub async fn with_db<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> chirpy_db::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    let value = tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(e.to_string())
        })??;
    Ok(value)
}
