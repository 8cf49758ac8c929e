use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Standardized error response format
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PublicErrorResponse {
    /// Machine-readable error code: `validation_error`, `conflict`,
    /// `unauthorized`, `not_found` or `internal_error`
    pub error: String,

    /// Human-readable error message
    pub message: String,
}

impl PublicErrorResponse {
    pub fn new(error: &str, message: impl Into<String>) -> Self {
        Self {
            error: error.to_string(),
            message: message.into(),
        }
    }
}
