use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::Response;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::ApiError;
use crate::state::AppState;

pub const TOKEN_TTL_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: usize,
}

pub fn create_token(subject: &str, jwt_secret: &str) -> Result<String, ApiError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .as_secs();
    let claims = Claims {
        sub: subject.to_string(),
        exp: (now + TOKEN_TTL_SECS) as usize,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(jwt_secret.as_bytes()))
        .map_err(|e| ApiError::Internal(format!("Failed to sign token: {}", e)))
}

/// Returns the token subject when the signature and expiry check out.
pub fn validate_token(token: &str, jwt_secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims.sub)
}

/// Guards the write routes with `Authorization: Bearer <token>`.
pub async fn authenticate(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".into()))?;
    let token = auth_header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::Unauthorized("Invalid Authorization header format".into()))?;
    let subject = validate_token(token, &state.config.jwt_secret)
        .map_err(|_| ApiError::Unauthorized("Invalid or expired token".into()))?;
    log::info!("Authenticated {} for {}", subject, request.uri().path());
    Ok(next.run(request).await)
}
