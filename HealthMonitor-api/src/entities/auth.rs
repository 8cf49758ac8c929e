use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Login request payload
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PublicLoginRequest {
    /// Registered phone number
    #[schema(example = "09120000001")]
    pub phone_number: String,

    /// Password
    pub password: String,
}

/// Access token issued on login
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PublicToken {
    /// JWT access token, sent back as `Authorization: Bearer <token>`
    pub access_token: String,

    /// Token type (always `bearer`)
    #[schema(example = "bearer")]
    pub token_type: String,
}

impl PublicToken {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}
