use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use tracing::{debug, info, warn};

use chirpy_types::api::WebhookRequest;

use crate::error::ApiError;
use crate::middleware::authorization;
use crate::state::{AppState, with_db};

const USER_UPGRADED: &str = "user.upgraded";

/// Payment provider callback. Only `user.upgraded` has an effect; other
/// events are acknowledged and dropped.
pub async fn polka_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<WebhookRequest>,
) -> Result<StatusCode, ApiError> {
    let key = authorization(&headers, "ApiKey")?;
    if state.polka_key.is_empty() || key != state.polka_key {
        warn!("webhook rejected: bad api key");
        return Err(ApiError::Unauthorized("invalid api key".into()));
    }

    if !req.event.eq_ignore_ascii_case(USER_UPGRADED) {
        debug!(event = %req.event, "ignoring webhook event");
        return Ok(StatusCode::NO_CONTENT);
    }

    let user_id = req
        .data
        .map(|d| d.user_id)
        .ok_or_else(|| ApiError::BadRequest("missing data.user_id".into()))?;

    with_db(&state, move |db| db.upgrade_user(user_id)).await?;

    info!(user_id, "user upgraded via webhook");
    Ok(StatusCode::NO_CONTENT)
}
