use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

/// Configure Swagger UI endpoints
pub fn configure_swagger_routes() -> SwaggerUi {
    SwaggerUi::new("/api-docs")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
}

/// Registers the `bearer` security scheme used by protected paths
struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

// API Documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health endpoints
        crate::api::handlers::health::health_check,

        // Auth endpoints
        crate::api::handlers::auth::login_access_token,

        // User endpoints
        crate::api::handlers::users::register,
        crate::api::handlers::users::read_current_user,
        crate::api::handlers::users::bind_device,
        crate::api::handlers::users::unbind_device,

        // Record endpoints
        crate::api::handlers::records::list_records,
        crate::api::handlers::records::create_record
    ),
    components(
        schemas(
            // Entities
            crate::entities::common::PublicErrorResponse,
            crate::entities::auth::PublicLoginRequest,
            crate::entities::auth::PublicToken,
            crate::entities::user::PublicGender,
            crate::entities::user::PublicRegistrationRequest,
            crate::entities::user::PublicUser,
            crate::entities::user::PublicBindDeviceRequest,
            crate::entities::record::PublicRecordType,
            crate::entities::record::PublicCreateRecordRequest,
            crate::entities::record::PublicRecord,
            crate::entities::record::PublicRecordPage,

            // Health handlers
            crate::api::handlers::health::HealthResponse,
            crate::api::handlers::health::ComponentStatus,
            crate::api::handlers::health::ComponentHealthStatus
        )
    ),
    modifiers(&BearerSecurity),
    tags(
        (name = "health", description = "Health check endpoint"),
        (name = "Authentication", description = "Access token issuance"),
        (name = "users", description = "Registration, profile and device binding"),
        (name = "records", description = "Device record ingestion and listing")
    ),
    info(
        title = "HealthMonitor API",
        version = "0.1.0",
        description = "API for registering users, binding devices and storing device health records",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        ),
    ),
    servers(
        (url = "/", description = "Local development server")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_doc_generation() {
        let openapi = ApiDoc::openapi();

        assert_eq!(openapi.info.title, "HealthMonitor API");
        assert_eq!(openapi.info.version, "0.1.0");

        let tags = openapi.tags.as_ref().unwrap();
        assert!(tags.iter().any(|tag| tag.name == "records"));
        assert!(tags.iter().any(|tag| tag.name == "users"));

        for path in [
            "/health",
            "/api/v1/register",
            "/api/v1/login/access-token",
            "/api/v1/users/me",
            "/api/v1/users/me/device",
            "/api/v1/record",
        ] {
            assert!(openapi.paths.paths.contains_key(path), "missing path {}", path);
        }

        let components = openapi.components.as_ref().unwrap();
        assert!(components.security_schemes.contains_key("bearer"));
        assert!(components.schemas.contains_key("PublicRecord"));
    }

    #[test]
    fn test_public_record_schema_has_no_device() {
        let json = serde_json::to_value(ApiDoc::openapi()).unwrap();
        let properties = &json["components"]["schemas"]["PublicRecord"]["properties"];
        assert!(properties.get("created_at").is_some());
        assert!(properties.get("device_id").is_none());
    }
}
