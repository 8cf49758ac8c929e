use std::time::Instant;
use axum::{extract::State, Json};
use tracing::{info, instrument, warn};

use health_monitor_domain::auth::logging::{log_auth_event, log_failed_login, AuthEvent, AuthEventType};
use crate::api::error::{ApiError, ApiJson};
use crate::api::state::AppState;
use crate::entities::auth::{PublicLoginRequest, PublicToken};
use crate::entities::common::PublicErrorResponse;

/// Exchange a phone number and password for an access token
#[utoipa::path(
    post,
    path = "/api/v1/login/access-token",
    request_body = PublicLoginRequest,
    responses(
        (status = 200, description = "Login successful. Send the access_token as 'Authorization: Bearer {token}'.", body = PublicToken),
        (status = 400, description = "Malformed request", body = PublicErrorResponse),
        (status = 401, description = "Incorrect phone number or password", body = PublicErrorResponse),
        (status = 500, description = "Internal server error", body = PublicErrorResponse)
    ),
    tag = "Authentication",
    operation_id = "login_access_token"
)]
#[instrument(skip(state, request))]
pub async fn login_access_token(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<PublicLoginRequest>,
) -> Result<Json<PublicToken>, ApiError> {
    let start_time = Instant::now();

    let user = match state.users.authenticate(&request.phone_number, &request.password).await? {
        Some(user) => user,
        None => {
            warn!("Rejected login attempt");
            log_failed_login(&request.phone_number, "Incorrect phone number or password");
            return Err(ApiError::Unauthorized);
        }
    };

    let access_token = state.tokens.generate_token(user.id)
        .map_err(|e| ApiError::Internal(format!("Failed to generate token: {}", e)))?;

    let event = AuthEvent::new(AuthEventType::Login, Some(&user.id.to_string()), true)
        .with_details("Login successful")
        .with_duration(start_time.elapsed().as_millis() as u64)
        .with_auth_method("password");
    log_auth_event(event);

    info!("Issued access token for user {}", user.id);
    Ok(Json(PublicToken::bearer(access_token)))
}
