use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use chirpy_db::{ChirpFilter, SortOrder};
use chirpy_types::api::{ChirpResponse, CreateChirpRequest};

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::state::{AppState, with_db};

#[derive(Debug, Deserialize)]
pub struct ChirpQuery {
    pub author_id: Option<u64>,
    #[serde(default)]
    pub sort: SortOrder,
}

pub async fn create_chirp(
    State(state): State<AppState>,
    AuthUser(author_id): AuthUser,
    Json(req): Json<CreateChirpRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let chirp = with_db(&state, move |db| db.create_chirp(&req.body, author_id)).await?;
    Ok((StatusCode::CREATED, Json(ChirpResponse::from(chirp))))
}

pub async fn list_chirps(
    State(state): State<AppState>,
    Query(query): Query<ChirpQuery>,
) -> Result<Json<Vec<ChirpResponse>>, ApiError> {
    let filter = ChirpFilter {
        author_id: query.author_id,
        sort: query.sort,
    };
    let chirps = with_db(&state, move |db| db.list_chirps(filter)).await?;
    Ok(Json(chirps.into_iter().map(ChirpResponse::from).collect()))
}

pub async fn get_chirp(
    State(state): State<AppState>,
    Path(chirp_id): Path<u64>,
) -> Result<Json<ChirpResponse>, ApiError> {
    let chirp = with_db(&state, move |db| db.get_chirp(chirp_id)).await?;
    Ok(Json(ChirpResponse::from(chirp)))
}

pub async fn delete_chirp(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(chirp_id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    with_db(&state, move |db| db.delete_chirp(chirp_id, user_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
