use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

use chirpy_types::api::{CreateUserRequest, UpdateUserRequest, UserResponse};

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::state::{AppState, with_db};

pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::BadRequest("email and password are required".into()));
    }

    let user = with_db(&state, move |db| db.create_user(req.email.trim(), &req.password)).await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// Change the caller's own email and/or password.
pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = with_db(&state, move |db| {
        db.update_user(user_id, Some(req.email.trim()), Some(&req.password))
    })
    .await?;

    Ok(Json(UserResponse::from(user)))
}
