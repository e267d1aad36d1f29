use axum::{Json, extract::State, http::HeaderMap, http::StatusCode};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::{debug, warn};

use chirpy_types::api::{Claims, LoginRequest, LoginResponse, TokenResponse};

use crate::error::ApiError;
use crate::middleware::bearer_token;
use crate::state::{AppState, with_db};

pub const ISSUER: &str = "chirpy";

/// Upper bound (and default) for access tokens minted at login.
const MAX_LOGIN_TOKEN_SECS: u64 = 24 * 60 * 60;
/// Lifetime of access tokens minted from a refresh token.
const REFRESH_ACCESS_TOKEN_HOURS: i64 = 1;

/// Signs and verifies HS256 access tokens with the configured secret.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn issue(&self, user_id: u64, ttl: Duration) -> Result<String, ApiError> {
        let now = Utc::now();
        let claims = Claims {
            iss: ISSUER.to_string(),
            sub: user_id.to_string(),
            iat: now.timestamp() as usize,
            exp: (now + ttl).timestamp() as usize,
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| ApiError::Internal(format!("failed to sign token: {e}")))
    }

    /// Validate signature, issuer and expiry; return the subject's user id.
    pub fn verify(&self, token: &str) -> Result<u64, ApiError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|_| ApiError::Unauthorized("invalid or expired token".into()))?;

        data.claims
            .sub
            .parse()
            .map_err(|_| ApiError::Unauthorized("malformed token subject".into()))
    }
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let LoginRequest {
        email,
        password,
        expires_in_seconds,
    } = req;

    let user = with_db(&state, move |db| db.authenticate(&email, &password)).await?;

    let token = state
        .tokens
        .issue(user.id, login_token_ttl(expires_in_seconds))?;
    let refresh_token = user
        .refresh_token
        .ok_or_else(|| ApiError::Internal("login did not issue a refresh token".into()))?;

    debug!(user_id = user.id, "user logged in");
    Ok(Json(LoginResponse {
        id: user.id,
        email: user.email,
        is_chirpy_red: user.is_upgraded,
        token,
        refresh_token,
    }))
}

/// Exchange a live refresh token for a short-lived access token.
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, ApiError> {
    let refresh_token = bearer_token(&headers)?.to_string();

    let user = with_db(&state, move |db| db.get_user_by_refresh_token(&refresh_token))
        .await?
        .filter(|u| u.has_live_refresh_token(Utc::now()))
        .ok_or_else(|| {
            warn!("refresh attempted with unknown or expired token");
            ApiError::Unauthorized("invalid or expired refresh token".into())
        })?;

    let token = state
        .tokens
        .issue(user.id, Duration::hours(REFRESH_ACCESS_TOKEN_HOURS))?;
    Ok(Json(TokenResponse { token }))
}

pub async fn revoke(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let refresh_token = bearer_token(&headers)?.to_string();
    with_db(&state, move |db| db.revoke_refresh_token(&refresh_token)).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn login_token_ttl(requested_secs: Option<u64>) -> Duration {
    let secs = match requested_secs {
        Some(s) if s > 0 && s < MAX_LOGIN_TOKEN_SECS => s,
        _ => MAX_LOGIN_TOKEN_SECS,
    };
    Duration::seconds(secs as i64)
}
