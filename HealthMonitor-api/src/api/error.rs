use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    extract::{FromRequest, FromRequestParts},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use health_monitor_domain::services::{RecordServiceError, UserServiceError};
use crate::entities::common::PublicErrorResponse;

/// Errors returned by API handlers
#[derive(Debug, Error)]
pub enum ApiError {
    /// Input rejected before reaching storage
    #[error("{0}")]
    Validation(String),

    /// Unique phone number, national id or device already taken
    #[error("{0}")]
    Conflict(String),

    /// Credentials did not match
    #[error("Incorrect phone number or password")]
    Unauthorized,

    #[error("{0}")]
    NotFound(String),

    /// Anything the caller cannot fix; details are logged, not returned
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation_error",
            ApiError::Conflict(_) => "conflict",
            ApiError::Unauthorized => "unauthorized",
            ApiError::NotFound(_) => "not_found",
            ApiError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            ApiError::Internal(details) => {
                error!("Internal error while handling request: {}", details);
                "An unexpected error occurred".to_string()
            }
            other => other.to_string(),
        };

        let body = PublicErrorResponse::new(self.code(), message);
        (self.status_code(), Json(body)).into_response()
    }
}

impl From<UserServiceError> for ApiError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::ValidationError(msg) => ApiError::Validation(msg),
            UserServiceError::Conflict(msg) => ApiError::Conflict(msg),
            UserServiceError::NotFound(msg) => ApiError::NotFound(msg),
            UserServiceError::PasswordError(msg) | UserServiceError::RepositoryError(msg) => {
                ApiError::Internal(msg)
            }
        }
    }
}

impl From<RecordServiceError> for ApiError {
    fn from(err: RecordServiceError) -> Self {
        match err {
            RecordServiceError::ValidationError(msg) => ApiError::Validation(msg),
            RecordServiceError::RepositoryError(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

/// JSON body extractor whose rejections use the API error shape
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Query string extractor whose rejections use the API error shape
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_error_shapes() {
        let response = ApiError::Conflict("A user with this phone number already exists".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let json = body_json(response).await;
        assert_eq!(json["error"], "conflict");
        assert_eq!(json["message"], "A user with this phone number already exists");

        let response = ApiError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"], "unauthorized");
    }

    #[tokio::test]
    async fn test_internal_details_are_not_leaked() {
        let response = ApiError::from(RecordServiceError::RepositoryError("disk I/O error".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(response).await;
        assert_eq!(json["error"], "internal_error");
        assert!(!json["message"].as_str().unwrap().contains("disk"));
    }

    #[test]
    fn test_service_errors_map_to_status() {
        assert_eq!(
            ApiError::from(UserServiceError::ValidationError("x".to_string())).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(UserServiceError::Conflict("x".to_string())).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(UserServiceError::PasswordError("x".to_string())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(RecordServiceError::ValidationError("x".to_string())).status_code(),
            StatusCode::BAD_REQUEST
        );
    }
}
