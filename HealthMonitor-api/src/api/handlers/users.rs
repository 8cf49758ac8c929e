use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use tracing::{info, instrument};

use health_monitor_domain::auth::CurrentUser;
use crate::api::error::{ApiError, ApiJson};
use crate::api::state::AppState;
use crate::entities::common::PublicErrorResponse;
use crate::entities::user::{
    convert_to_domain_bind_device, convert_to_domain_registration, convert_to_public_user,
    PublicBindDeviceRequest, PublicRegistrationRequest, PublicUser,
};

/// Register a new user
#[utoipa::path(
    post,
    path = "/api/v1/register",
    request_body = PublicRegistrationRequest,
    responses(
        (status = 201, description = "User registered", body = PublicUser),
        (status = 400, description = "Invalid profile", body = PublicErrorResponse),
        (status = 409, description = "Phone number or national ID already registered", body = PublicErrorResponse),
        (status = 500, description = "Internal server error", body = PublicErrorResponse)
    ),
    tag = "users"
)]
#[instrument(skip(state, request))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<PublicRegistrationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.users.register(convert_to_domain_registration(request)).await?;

    info!("Registered user {}", user.id);
    Ok((StatusCode::CREATED, Json(convert_to_public_user(user))))
}

/// The authenticated user's profile
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Current user", body = PublicUser),
        (status = 401, description = "Missing or invalid bearer token")
    ),
    security(
        ("bearer" = [])
    ),
    tag = "users"
)]
#[instrument(skip(current))]
pub async fn read_current_user(Extension(current): Extension<CurrentUser>) -> Json<PublicUser> {
    Json(convert_to_public_user(current.0))
}

/// Bind a device to the authenticated user, replacing any previous binding
#[utoipa::path(
    put,
    path = "/api/v1/users/me/device",
    request_body = PublicBindDeviceRequest,
    responses(
        (status = 200, description = "Device bound", body = PublicUser),
        (status = 400, description = "Invalid device id", body = PublicErrorResponse),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 409, description = "Device is bound to another account", body = PublicErrorResponse)
    ),
    security(
        ("bearer" = [])
    ),
    tag = "users"
)]
#[instrument(skip(state, current, request))]
pub async fn bind_device(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    ApiJson(request): ApiJson<PublicBindDeviceRequest>,
) -> Result<Json<PublicUser>, ApiError> {
    let user = state.users
        .bind_device(&current.0, convert_to_domain_bind_device(request))
        .await?;

    Ok(Json(convert_to_public_user(user)))
}

/// Release the authenticated user's device
#[utoipa::path(
    delete,
    path = "/api/v1/users/me/device",
    responses(
        (status = 200, description = "Device released", body = PublicUser),
        (status = 401, description = "Missing or invalid bearer token")
    ),
    security(
        ("bearer" = [])
    ),
    tag = "users"
)]
#[instrument(skip(state, current))]
pub async fn unbind_device(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<PublicUser>, ApiError> {
    let user = state.users.unbind_device(&current.0).await?;
    Ok(Json(convert_to_public_user(user)))
}
