use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::jwt::JwtConfig;
use crate::utils::errors::AppError;

/// Bearer token claims. The directory stays the source of truth for role and
/// active flag; tokens only assert identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id
    pub exp: usize,
    pub iat: usize,
}

pub fn create_access_token(user_id: Uuid, jwt_config: &JwtConfig) -> Result<String, AppError> {
    let now = Utc::now().timestamp() as usize;
    let exp = now + jwt_config.access_token_expiry as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        exp,
        iat: now,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| AppError::internal(anyhow::anyhow!("Failed to create token: {e}")))
}

pub fn verify_token(token: &str, jwt_config: &JwtConfig) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized("Invalid or expired token".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret".to_string(),
            access_token_expiry: 3600,
        }
    }

    #[test]
    fn round_trips_a_valid_token() {
        let config = test_config();
        let user_id = Uuid::new_v4();
        let token = create_access_token(user_id, &config).unwrap();
        let claims = verify_token(&token, &config).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
    }

    #[test]
    fn rejects_a_token_signed_with_another_secret() {
        let token = create_access_token(Uuid::new_v4(), &test_config()).unwrap();
        let other = JwtConfig {
            secret: "different-secret".to_string(),
            access_token_expiry: 3600,
        };
        assert!(verify_token(&token, &other).is_err());
    }

    #[test]
    fn rejects_garbage() {
        assert!(verify_token("not-a-token", &test_config()).is_err());
    }
}
