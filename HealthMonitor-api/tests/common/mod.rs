#![allow(dead_code)]

use std::sync::Arc;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Duration;
use serde_json::{json, Value};
use tower::ServiceExt;

use health_monitor_api::api::{routes::create_router, AppState};
use health_monitor_data::database::DatabasePool;
use health_monitor_data::repository::{RecordRepository, UserRepository};
use health_monitor_domain::auth::token::{TokenConfig, TokenService};
use health_monitor_domain::health::HealthService;
use health_monitor_domain::services::records::create_record_service;
use health_monitor_domain::services::users::create_user_service;
use health_monitor_domain::testing::fast_password_manager;

// Initialize tracing once for all tests
static INIT: std::sync::Once = std::sync::Once::new();

pub fn initialize() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("info")
            .with_test_writer()
            .try_init();
    });
}

/// Application over a fresh in-memory SQLite database
pub fn test_app() -> Router {
    initialize();

    let pool = DatabasePool::in_memory().unwrap();
    let users = create_user_service(UserRepository::with_pool(pool.clone()), fast_password_manager().unwrap());
    let records = create_record_service(RecordRepository::with_pool(pool.clone()));
    let tokens = Arc::new(TokenService::new(TokenConfig {
        secret: "integration-test-secret".to_string(),
        issuer: "health-monitor-tests".to_string(),
        expiration: Duration::minutes(30),
    }));
    let health = Arc::new(HealthService::new(Some(pool)));

    create_router(AppState::new(users, records, tokens, health))
}

/// Send a request and decode the JSON body; empty bodies decode to `Value::Null`
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();

    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };

    (status, value)
}

pub fn registration(phone_number: &str, national_id: &str) -> Value {
    json!({
        "phone_number": phone_number,
        "national_id": national_id,
        "full_name": "Test Patient",
        "password": "correct-horse",
        "gender": "female",
        "birth_date": "1992-11-03",
        "height": 165,
        "weight": 58,
        "sickness": "asthma",
        "sickness_history": ["bronchitis"],
        "family_sickness_history": [],
        "medicines": ["salbutamol"],
        "allergies": []
    })
}

pub async fn register(app: &Router, phone_number: &str, national_id: &str) -> Value {
    let (status, body) = send(app, Method::POST, "/api/v1/register", None, Some(registration(phone_number, national_id))).await;
    assert_eq!(status, StatusCode::CREATED, "registration failed: {}", body);
    body
}

pub async fn login(app: &Router, phone_number: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/v1/login/access-token",
        None,
        Some(json!({ "phone_number": phone_number, "password": "correct-horse" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    body["access_token"].as_str().unwrap().to_string()
}

/// Register, log in and bind a device; returns the access token
pub async fn user_with_device(app: &Router, phone_number: &str, national_id: &str, device_id: &str) -> String {
    register(app, phone_number, national_id).await;
    let token = login(app, phone_number).await;

    let (status, body) = send(
        app,
        Method::PUT,
        "/api/v1/users/me/device",
        Some(&token),
        Some(json!({ "device_id": device_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "binding failed: {}", body);

    token
}

/// Application over mock services with a configurable health report
pub fn app_with_health(health: health_monitor_domain::testing::MockHealthService) -> Router {
    use health_monitor_domain::testing::{create_mock_record_service, create_mock_user_service, MockRecordRepository};

    initialize();

    let tokens = Arc::new(TokenService::new(TokenConfig {
        secret: "integration-test-secret".to_string(),
        issuer: "health-monitor-tests".to_string(),
        expiration: Duration::minutes(30),
    }));

    create_router(AppState::new(
        create_mock_user_service().unwrap(),
        create_mock_record_service(MockRecordRepository::new()),
        tokens,
        Arc::new(health),
    ))
}
