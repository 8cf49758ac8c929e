use thiserror::Error;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Algorithm, Validation};
use std::env;
use tracing::{debug, error, info};
use chrono::{Duration, Utc};
use crate::auth::Claims;

/// Default access token lifetime: eight days
pub const DEFAULT_ACCESS_TOKEN_EXPIRATION_MINUTES: i64 = 60 * 24 * 8;

/// Default token issuer
pub const DEFAULT_ISSUER: &str = "health-monitor-api";

/// Security errors for authentication and token operations
#[derive(Debug, Error)]
pub enum SecurityError {
    /// JWT validation error
    #[error("Token validation error: {0}")]
    TokenValidation(String),

    /// Expired token
    #[error("Token has expired")]
    TokenExpired,

    /// Invalid token structure
    #[error("Invalid token format")]
    InvalidToken,

    /// Configuration error
    #[error("Security configuration error: {0}")]
    ConfigError(String),
}

/// Token signing settings
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// HMAC secret
    pub secret: String,
    /// Value of the `iss` claim
    pub issuer: String,
    /// Access token lifetime
    pub expiration: Duration,
}

impl TokenConfig {
    /// Load token settings from `JWT_SECRET`, `JWT_ISSUER` and
    /// `ACCESS_TOKEN_EXPIRATION_MINUTES`
    pub fn from_env() -> Result<Self, SecurityError> {
        let secret = env::var("JWT_SECRET").map_err(|e| {
            error!("JWT_SECRET environment variable not found: {}", e);
            SecurityError::ConfigError("JWT_SECRET environment variable not found".to_string())
        })?;

        let issuer = env::var("JWT_ISSUER")
            .unwrap_or_else(|_| DEFAULT_ISSUER.to_string());

        let expiration_minutes = env::var("ACCESS_TOKEN_EXPIRATION_MINUTES")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(DEFAULT_ACCESS_TOKEN_EXPIRATION_MINUTES);

        Ok(Self {
            secret,
            issuer,
            expiration: Duration::minutes(expiration_minutes),
        })
    }
}

/// Issues and validates HS256 bearer tokens
#[derive(Debug, Clone)]
pub struct TokenService {
    config: TokenConfig,
}

impl TokenService {
    /// Create a new token service
    pub fn new(config: TokenConfig) -> Self {
        Self { config }
    }

    /// Create a token service configured from the environment
    pub fn from_env() -> Result<Self, SecurityError> {
        Ok(Self::new(TokenConfig::from_env()?))
    }

    /// Generate an access token whose subject is the user id
    pub fn generate_token(&self, user_id: i64) -> Result<String, SecurityError> {
        let now = Utc::now();
        let expiration = now + self.config.expiration;

        let claims = Claims {
            sub: user_id.to_string(),
            iss: self.config.issuer.clone(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.secret.as_bytes()),
        ).map_err(|e| {
            error!("Failed to encode JWT token: {}", e);
            SecurityError::TokenValidation(e.to_string())
        })?;

        // Log token generation (but not the token itself)
        info!("Generated access token for user {}", user_id);
        debug!("Token expiration: {}", expiration);

        Ok(token)
    }

    /// Validate a JWT token and return the decoded claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, SecurityError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_issuer(&[self.config.issuer.as_str()]);

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.secret.as_bytes()),
            &validation,
        ).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => SecurityError::TokenExpired,
                jsonwebtoken::errors::ErrorKind::InvalidToken => SecurityError::InvalidToken,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => SecurityError::TokenValidation("Invalid signature".to_string()),
                _ => SecurityError::TokenValidation(e.to_string()),
            }
        })?;

        Ok(token_data.claims)
    }

    /// Validate a token and parse its subject as a user id
    pub fn user_id_from_token(&self, token: &str) -> Result<i64, SecurityError> {
        let claims = self.validate_token(token)?;
        claims.sub.parse::<i64>()
            .map_err(|_| SecurityError::TokenValidation(format!("Invalid subject: {}", claims.sub)))
    }
}
