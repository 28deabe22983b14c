use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::{SecurityConfig, MAX_JWT_EXPIRY_HOURS};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: Uuid,
    pub username: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    /// Lifetimes above `MAX_JWT_EXPIRY_HOURS` are clamped to it.
    pub fn new(user_id: Uuid, username: impl Into<String>, expiry_hours: u64) -> Self {
        let now = Utc::now();
        let hours = expiry_hours.min(MAX_JWT_EXPIRY_HOURS) as i64;
        let exp = (now + Duration::hours(hours)).timestamp();

        Self {
            sub: user_id,
            username: username.into(),
            exp,
            iat: now.timestamp(),
        }
    }

    /// Seconds between issue and expiry
    pub fn lifetime_secs(&self) -> u64 {
        u64::try_from(self.exp - self.iat).unwrap_or(0)
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authentication credentials were not provided")]
    MissingCredentials,

    #[error("Authorization header must use Bearer token format")]
    MalformedHeader,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("User not found")]
    UnknownUser,

    #[error("No active account found with the given credentials")]
    InvalidCredentials,

    #[error("JWT secret not configured")]
    MissingSecret,

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Password hashing failed: {0}")]
    PasswordHashing(String),
}

pub fn generate_jwt(claims: &Claims, security: &SecurityConfig) -> Result<String, AuthError> {
    if security.jwt_secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }

    let encoding_key = EncodingKey::from_secret(security.jwt_secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key)
        .map_err(|e| AuthError::TokenGeneration(e.to_string()))
}

/// Validate signature and expiry, returning the embedded claims.
pub fn validate_jwt(token: &str, security: &SecurityConfig) -> Result<Claims, AuthError> {
    if security.jwt_secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }

    let decoding_key = DecodingKey::from_secret(security.jwt_secret.as_bytes());
    let token_data = decode::<Claims>(token, &decoding_key, &Validation::default())
        .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

    Ok(token_data.claims)
}

/// bcrypt accepts work factors in this range.
pub const MIN_PASSWORD_HASH_COST: u32 = 4;
pub const MAX_PASSWORD_HASH_COST: u32 = 31;

/// Hash a password with bcrypt at the given work factor.
pub fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    bcrypt::hash(password, cost).map_err(|e| AuthError::PasswordHashing(e.to_string()))
}

/// Check a password against a stored bcrypt hash. Malformed hashes never match.
pub fn verify_password(password: &str, stored: &str) -> bool {
    bcrypt::verify(password, stored).unwrap_or_else(|e| {
        tracing::warn!("Stored password hash could not be verified: {}", e);
        false
    })
}
