pub mod password;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::authz::{Principal, Role};
use crate::config;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub roles: Vec<Role>,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, username: String, roles: Vec<Role>) -> Self {
        let now = Utc::now();
        let expiry_hours = config::config().security.jwt_expiry_hours;
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub: user_id,
            username,
            roles,
            exp,
            iat: now.timestamp(),
        }
    }

    pub fn principal(&self) -> Principal {
        Principal {
            id: self.sub,
            username: self.username.clone(),
            roles: self.roles.clone(),
        }
    }
}

#[derive(Debug)]
pub enum JwtError {
    TokenGeneration(String),
    InvalidToken(String),
    InvalidSecret,
}

impl std::fmt::Display for JwtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JwtError::TokenGeneration(msg) => write!(f, "JWT generation error: {}", msg),
            JwtError::InvalidToken(msg) => write!(f, "Invalid JWT token: {}", msg),
            JwtError::InvalidSecret => write!(f, "Invalid JWT secret"),
        }
    }
}

impl std::error::Error for JwtError {}

pub fn generate_jwt(claims: Claims) -> Result<String, JwtError> {
    let secret = &config::config().security.jwt_secret;

    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    let header = Header::default();

    encode(&header, &claims, &encoding_key)
        .map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

pub fn verify_jwt(token: &str) -> Result<Claims, JwtError> {
    let secret = &config::config().security.jwt_secret;

    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::default();

    let token_data = decode::<Claims>(token, &decoding_key, &validation)
        .map_err(|e| JwtError::InvalidToken(e.to_string()))?;

    Ok(token_data.claims)
}

/// Short-lived single-purpose token for the stateless password-reset
/// flow. Not interchangeable with session tokens: the purpose field is
/// checked on verification.
#[derive(Debug, Serialize, Deserialize)]
pub struct ResetClaims {
    pub sub: Uuid,
    pub purpose: String,
    pub exp: i64,
    pub iat: i64,
}

const RESET_PURPOSE: &str = "password-reset";
const RESET_VALIDITY_MINUTES: i64 = 60;

pub fn generate_reset_token(user_id: Uuid) -> Result<String, JwtError> {
    let secret = &config::config().security.jwt_secret;
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let now = Utc::now();
    let claims = ResetClaims {
        sub: user_id,
        purpose: RESET_PURPOSE.to_string(),
        exp: (now + Duration::minutes(RESET_VALIDITY_MINUTES)).timestamp(),
        iat: now.timestamp(),
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

pub fn verify_reset_token(token: &str) -> Result<Uuid, JwtError> {
    let secret = &config::config().security.jwt_secret;
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let data = decode::<ResetClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| JwtError::InvalidToken(e.to_string()))?;

    if data.claims.purpose != RESET_PURPOSE {
        return Err(JwtError::InvalidToken("wrong token purpose".to_string()));
    }

    Ok(data.claims.sub)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_tokens_round_trip() {
        let id = Uuid::new_v4();
        let claims = Claims::new(id, "mika".to_string(), vec![Role::User, Role::Editor]);
        let token = generate_jwt(claims).unwrap();

        let decoded = verify_jwt(&token).unwrap();
        assert_eq!(decoded.sub, id);
        assert_eq!(decoded.username, "mika");
        assert_eq!(decoded.roles, vec![Role::User, Role::Editor]);
    }

    #[test]
    fn tampered_tokens_are_rejected() {
        let claims = Claims::new(Uuid::new_v4(), "mika".to_string(), vec![Role::User]);
        let mut token = generate_jwt(claims).unwrap();
        token.push('x');
        assert!(verify_jwt(&token).is_err());
    }

    #[test]
    fn reset_tokens_round_trip_and_keep_their_purpose() {
        let id = Uuid::new_v4();
        let token = generate_reset_token(id).unwrap();
        assert_eq!(verify_reset_token(&token).unwrap(), id);

        // A session token is not a reset token
        let session = generate_jwt(Claims::new(id, "mika".to_string(), vec![Role::User])).unwrap();
        assert!(verify_reset_token(&session).is_err());
    }
}
