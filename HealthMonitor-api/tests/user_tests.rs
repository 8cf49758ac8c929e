mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;
use common::{login, register, registration, send, test_app};

#[tokio::test]
async fn test_register_echoes_profile_without_password() {
    let app = test_app();

    let user = register(&app, "09121111111", "1111111111").await;

    assert!(user["id"].as_i64().unwrap() > 0);
    assert_eq!(user["phone_number"], "09121111111");
    assert_eq!(user["national_id"], "1111111111");
    assert_eq!(user["gender"], "female");
    assert_eq!(user["birth_date"], "1992-11-03");
    assert_eq!(user["medicines"], json!(["salbutamol"]));
    assert!(user["device_id"].is_null());
    assert!(user.get("password").is_none());
    assert!(user.get("hashed_password").is_none());
}

#[tokio::test]
async fn test_duplicate_phone_or_national_id_conflicts() {
    let app = test_app();
    register(&app, "09121111111", "1111111111").await;

    let (status, body) = send(&app, Method::POST, "/api/v1/register", None, Some(registration("09121111111", "2222222222"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
    assert!(body["message"].as_str().unwrap().contains("phone number"));

    let (status, body) = send(&app, Method::POST, "/api/v1/register", None, Some(registration("09122222222", "1111111111"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["message"].as_str().unwrap().contains("national ID"));

    // the first user is unaffected
    let token = login(&app, "09121111111").await;
    let (status, me) = send(&app, Method::GET, "/api/v1/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["national_id"], "1111111111");
}

#[tokio::test]
async fn test_invalid_registration_is_rejected() {
    let app = test_app();

    let mut request = registration("0912-abc", "1111111111");
    request["height"] = json!(0);
    let (status, body) = send(&app, Method::POST, "/api/v1/register", None, Some(request)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("phone_number"));
    assert!(message.contains("height"));

    let mut request = registration("09121111111", "1111111111");
    request["gender"] = json!("other");
    let (status, body) = send(&app, Method::POST, "/api/v1/register", None, Some(request)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    // nothing was stored by the rejected attempts
    register(&app, "09121111111", "1111111111").await;
}

#[tokio::test]
async fn test_login() {
    let app = test_app();
    register(&app, "09121111111", "1111111111").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/login/access-token",
        None,
        Some(json!({ "phone_number": "09121111111", "password": "correct-horse" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "bearer");
    assert!(!body["access_token"].as_str().unwrap().is_empty());

    for (phone_number, password) in [("09121111111", "wrong-password"), ("09129999999", "correct-horse")] {
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/login/access-token",
            None,
            Some(json!({ "phone_number": phone_number, "password": password })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "unauthorized");
    }
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = test_app();

    let (status, body) = send(&app, Method::GET, "/api/v1/users/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.is_null());

    let (status, _) = send(&app, Method::GET, "/api/v1/users/me", Some("not-a-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::GET, "/api/v1/record?skip=0&rtype=ECG", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_device_binding_lifecycle() {
    let app = test_app();
    register(&app, "09121111111", "1111111111").await;
    register(&app, "09122222222", "2222222222").await;
    let first = login(&app, "09121111111").await;
    let second = login(&app, "09122222222").await;

    let (status, me) = send(&app, Method::PUT, "/api/v1/users/me/device", Some(&first), Some(json!({ "device_id": "watch-1" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["device_id"], "watch-1");

    // binding the same device again is a no-op
    let (status, me) = send(&app, Method::PUT, "/api/v1/users/me/device", Some(&first), Some(json!({ "device_id": "watch-1" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["device_id"], "watch-1");

    let (status, body) = send(&app, Method::PUT, "/api/v1/users/me/device", Some(&second), Some(json!({ "device_id": "watch-1" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    // moving to a new device releases the old one
    let (status, me) = send(&app, Method::PUT, "/api/v1/users/me/device", Some(&first), Some(json!({ "device_id": "watch-2" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["device_id"], "watch-2");

    let (status, me) = send(&app, Method::PUT, "/api/v1/users/me/device", Some(&second), Some(json!({ "device_id": "watch-1" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["device_id"], "watch-1");

    let (status, me) = send(&app, Method::DELETE, "/api/v1/users/me/device", Some(&first), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(me["device_id"].is_null());

    let (status, body) = send(&app, Method::PUT, "/api/v1/users/me/device", Some(&first), Some(json!({ "device_id": "" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}
