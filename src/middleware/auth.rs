use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use uuid::Uuid;

use crate::modules::chat::model::UserRecord;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::jwt::{Claims, verify_token};

/// Extractor that validates the bearer token and provides the claims.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.0.sub)
            .map_err(|_| AppError::unauthorized("Invalid user ID in token".to_string()))
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing authorization header".to_string()))?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::unauthorized("Invalid authorization header format".to_string())
        })?;

        let claims = verify_token(token, &state.jwt_config)?;

        Ok(AuthUser(claims))
    }
}

/// Resolves the claims to a directory snapshot through the TTL cache, the
/// same path the websocket handshake uses, so both surfaces agree on who a
/// token belongs to. Missing or deactivated users are rejected.
pub async fn current_user(state: &AppState, auth: &AuthUser) -> Result<UserRecord, AppError> {
    let user_id = auth.user_id()?;
    let user = state
        .user_cache
        .get_or_fetch(state.directory.as_ref(), user_id)
        .await
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::unauthorized("User not found".to_string()))?;

    if !user.active {
        return Err(AppError::unauthorized("Account is deactivated".to_string()));
    }
    Ok(user)
}
