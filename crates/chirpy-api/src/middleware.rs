use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};

use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated user id, taken from a bearer access token.
///
/// Verification goes through the `TokenService` held in the app state.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub u64);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let user_id = state.tokens.verify(token)?;
        Ok(Self(user_id))
    }
}

/// Credential from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    authorization(headers, "Bearer")
}

/// Credential from an `Authorization: <scheme> <value>` header.
pub fn authorization<'a>(headers: &'a HeaderMap, scheme: &str) -> Result<&'a str, ApiError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("missing authorization header".into()))?;

    value
        .split_once(' ')
        .filter(|(found, _)| found.eq_ignore_ascii_case(scheme))
        .map(|(_, credential)| credential.trim())
        .filter(|credential| !credential.is_empty())
        .ok_or_else(|| ApiError::Unauthorized(format!("expected {scheme} authorization")))
}
