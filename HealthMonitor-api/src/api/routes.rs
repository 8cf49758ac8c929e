use axum::{
    extract::FromRef,
    http::{header, HeaderName, HeaderValue, Method},
    middleware,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing::debug;

use health_monitor_domain::auth::{auth_middleware, AuthState};
use crate::api::handlers::{auth, health, records, users};
use crate::api::state::{AppState, StartupError};
use crate::openapi::configure_swagger_routes;

/// Build the application router around the given state
pub fn create_router(state: AppState) -> Router {
    debug!("Creating application router");

    let auth_state = AuthState::from_ref(&state);

    // Routes that require a bearer token
    let protected_routes = Router::new()
        .route("/users/me", get(users::read_current_user))
        .route("/users/me/device", put(users::bind_device).delete(users::unbind_device))
        .route("/record", get(records::list_records).post(records::create_record))
        .route_layer(middleware::from_fn_with_state(auth_state, auth_middleware));

    let public_routes = Router::new()
        .route("/register", post(users::register))
        .route("/login/access-token", post(auth::login_access_token));

    let app = Router::new()
        .route("/health", get(health::health_check))
        .nest("/api/v1", public_routes.merge(protected_routes))
        .with_state(state)
        .merge(configure_swagger_routes());

    debug!("Routes configured");

    configure_security(app).layer(TraceLayer::new_for_http())
}

/// Build the application from the environment
pub async fn create_app() -> Result<Router, StartupError> {
    let state = AppState::from_env()?;
    Ok(create_router(state))
}

/// CORS and security response headers
pub fn configure_security(app: Router) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .max_age(std::time::Duration::from_secs(3600));

    let security_headers = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("no-referrer"),
        ));

    app.layer(cors).layer(security_headers)
}
