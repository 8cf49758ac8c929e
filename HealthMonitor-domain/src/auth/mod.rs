//! Authentication module for HealthMonitor API
//!
//! Provides the bearer-token middleware that resolves the calling user for
//! protected endpoints, plus the credential and token primitives it uses.

use std::sync::Arc;
use std::time::Instant;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    body::Body,
    Json,
};
use tracing::{debug, error, warn};
use serde::{Deserialize, Serialize};

use crate::auth::logging::{log_auth_event, AuthEvent, AuthEventType};
use crate::auth::token::TokenService;
use crate::entities::User;
use crate::services::UserServiceTrait;

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

// Device-scoped access control
pub mod access;

// Auth audit logging
pub mod logging;

// Argon2 credential store
pub mod password;

// JWT issuing and validation
pub mod token;

/// Authentication claims for JSON Web Tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Issuer
    pub iss: String,
    /// Issued at (as timestamp)
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
}

/// The authenticated caller, inserted into request extensions by [`auth_middleware`]
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    /// Device scope of the caller
    pub fn scope(&self) -> access::DeviceScope {
        access::DeviceScope::for_user(&self.0)
    }
}

/// State needed to resolve a bearer token to a user
#[derive(Clone)]
pub struct AuthState {
    pub tokens: Arc<TokenService>,
    pub users: Arc<dyn UserServiceTrait>,
}

impl AuthState {
    pub fn new(tokens: Arc<TokenService>, users: Arc<dyn UserServiceTrait>) -> Self {
        Self { tokens, users }
    }
}

fn unauthorized() -> Response {
    Response::builder()
        .status(StatusCode::UNAUTHORIZED)
        .body(Body::empty())
        .unwrap_or_default()
}

/// Body of the 500 response, same shape as the API's error responses
#[derive(Serialize)]
struct InternalErrorBody {
    error: &'static str,
    message: &'static str,
}

fn internal_error() -> Response {
    let body = InternalErrorBody {
        error: "internal_error",
        message: "An unexpected error occurred",
    };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

fn log_failure(user_id: Option<&str>, details: &str, resource: &str, start_time: Instant) {
    let event = AuthEvent::new(AuthEventType::TokenValidation, user_id, false)
        .with_details(details)
        .with_resource(resource)
        .with_duration(start_time.elapsed().as_millis() as u64)
        .with_auth_method("jwt");

    log_auth_event(event);
}

fn reject(user_id: Option<&str>, details: &str, resource: &str, start_time: Instant) -> Response {
    log_failure(user_id, details, resource, start_time);
    unauthorized()
}

/// Authentication middleware for protected routes
///
/// Expects `Authorization: Bearer <token>`. On success the caller is available
/// to handlers as `Extension<CurrentUser>`. A missing, malformed or invalid
/// token, or one whose user no longer exists, is an empty 401; a storage
/// failure while loading the user is a 500.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Response {
    let request_path = req.uri().path().to_string();
    let start_time = Instant::now();

    let auth_header = match req.headers().get(header::AUTHORIZATION) {
        Some(value) => match value.to_str() {
            Ok(auth_str) => auth_str,
            Err(_) => {
                warn!("Invalid Authorization header format");
                return reject(None, "Invalid Authorization header format", &request_path, start_time);
            }
        },
        None => {
            debug!("Missing Authorization header");
            return reject(None, "Missing Authorization header", &request_path, start_time);
        }
    };

    let token = match auth_header.strip_prefix("Bearer ") {
        Some(token) if !token.is_empty() => token,
        _ => {
            warn!("Authorization header does not contain Bearer token");
            return reject(None, "Authorization header does not contain Bearer token", &request_path, start_time);
        }
    };

    let user_id = match state.tokens.user_id_from_token(token) {
        Ok(user_id) => user_id,
        Err(e) => {
            warn!("Rejected bearer token: {}", e);
            return reject(None, &e.to_string(), &request_path, start_time);
        }
    };
    let user_id_str = user_id.to_string();

    let user = match state.users.find_by_id(user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            warn!("Token subject {} no longer exists", user_id);
            return reject(Some(&user_id_str), "User not found", &request_path, start_time);
        }
        Err(e) => {
            error!("Failed to load user {} for token: {}", user_id, e);
            log_failure(Some(&user_id_str), "User lookup failed", &request_path, start_time);
            return internal_error();
        }
    };

    let event = AuthEvent::new(AuthEventType::TokenValidation, Some(&user_id_str), true)
        .with_details("JWT validation successful")
        .with_resource(request_path)
        .with_duration(start_time.elapsed().as_millis() as u64)
        .with_auth_method("jwt");
    log_auth_event(event);

    req.extensions_mut().insert(CurrentUser(user));
    next.run(req).await
}
