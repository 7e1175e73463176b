//! End-to-end tests of the HTTP surface, driven through the router.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use authgate_backend::{
    auth::{issue_session, HashParams, SessionValidator},
    config::Settings,
    router::create_router,
    storage::MemoryUserStore,
    AppState,
};

const SECRET: &str = "integration-test-secret";

fn test_state() -> Arc<AppState> {
    let mut settings = Settings::default();
    settings.jwt.secret = SECRET.to_string();
    settings.jwt.ttl_secs = 3600;
    settings.password = HashParams {
        log_n: 4,
        r: 8,
        p: 1,
    };
    Arc::new(AppState::new(Arc::new(MemoryUserStore::new()), settings))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_with_auth(uri: &str, authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_with_auth(uri: &str, authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri(uri);
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder.body(Body::empty()).unwrap()
}

async fn register_and_login(app: &Router, username: &str, password: &str) -> (i64, String) {
    let (status, body) = send(
        app,
        post_json(
            "/api/v1/auth/register",
            json!({"username": username, "password": password, "email": format!("{username}@example.com")}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let (status, body) = send(
        app,
        post_json(
            "/api/v1/auth/login",
            json!({"username": username, "password": password}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    (
        body["data"]["user"]["id"].as_i64().unwrap(),
        body["data"]["token"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn test_health() {
    let app = create_router(test_state());
    let (status, body) = send(&app, get_with_auth("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_register_login_profile_flow() {
    let app = create_router(test_state());
    let (user_id, token) = register_and_login(&app, "alice", "pa55word").await;

    let (status, body) = send(
        &app,
        get_with_auth("/api/v1/user/profile", Some(&format!("Bearer {token}"))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], user_id);
    assert_eq!(body["data"]["username"], "alice");
    assert_eq!(body["data"]["email"], "alice@example.com");
    assert!(body["data"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_login_response_hides_password_hash() {
    let app = create_router(test_state());
    register_and_login(&app, "bob", "pa55word").await;
    let (_, body) = send(
        &app,
        post_json(
            "/api/v1/auth/login",
            json!({"username": "bob", "password": "pa55word"}),
        ),
    )
    .await;
    let text = body.to_string();
    assert!(!text.contains("scrypt"));
    assert!(!text.contains("pa55word"));
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = create_router(test_state());
    register_and_login(&app, "carol", "pa55word").await;

    let (s1, wrong_password) = send(
        &app,
        post_json(
            "/api/v1/auth/login",
            json!({"username": "carol", "password": "nope-nope"}),
        ),
    )
    .await;
    let (s2, unknown_user) = send(
        &app,
        post_json(
            "/api/v1/auth/login",
            json!({"username": "nobody", "password": "pa55word"}),
        ),
    )
    .await;
    assert_eq!(s1, StatusCode::UNAUTHORIZED);
    assert_eq!(s2, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password, unknown_user);
}

#[tokio::test]
async fn test_register_conflict_and_validation() {
    let app = create_router(test_state());
    register_and_login(&app, "dave", "pa55word").await;

    let (status, body) = send(
        &app,
        post_json(
            "/api/v1/auth/register",
            json!({"username": "dave", "password": "another1", "email": "d2@example.com"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "USER_001");

    let (status, body) = send(
        &app,
        post_json(
            "/api/v1/auth/register",
            json!({"username": "eve", "password": "123", "email": "eve@example.com"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VAL_001");

    let (status, _) = send(
        &app,
        post_json(
            "/api/v1/auth/register",
            json!({"username": "eve", "password": "pa55word", "email": "not-an-email"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_required_route_policy() {
    let app = create_router(test_state());
    let expired = issue_session(
        1,
        "ghost",
        &SECRET.into(),
        Duration::from_secs(60),
        SessionValidator::now() - 120,
    );

    let cases = [
        (None, "AUTH_001"),
        (Some("Basic abc".to_string()), "AUTH_002"),
        (Some("Bearer".to_string()), "AUTH_002"),
        (Some(format!("Bearer {expired}")), "AUTH_003"),
        (Some("Bearer a.b.c".to_string()), "AUTH_003"),
    ];
    for (header, code) in cases {
        let (status, body) = send(
            &app,
            get_with_auth("/api/v1/user/profile", header.as_deref()),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "header {header:?}");
        assert_eq!(body["error"]["code"], code, "header {header:?}");
    }
}

#[tokio::test]
async fn test_token_signed_with_other_secret_is_rejected() {
    let app = create_router(test_state());
    let forged = issue_session(
        1,
        "admin",
        &"some-other-secret".into(),
        Duration::from_secs(600),
        SessionValidator::now(),
    );
    let (status, body) = send(
        &app,
        get_with_auth("/api/v1/user/profile", Some(&format!("Bearer {forged}"))),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "AUTH_003");
}

#[tokio::test]
async fn test_optional_route_policy() {
    let app = create_router(test_state());
    let (user_id, token) = register_and_login(&app, "frank", "pa55word").await;

    let (status, body) = send(&app, get_with_auth("/api/v1/auth/whoami", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["state"], "anonymous");

    for junk in ["Basic abc", "Bearer junk", "Bearer  double-space"] {
        let (status, body) = send(&app, get_with_auth("/api/v1/auth/whoami", Some(junk))).await;
        assert_eq!(status, StatusCode::OK, "header {junk:?}");
        assert_eq!(body["data"]["state"], "anonymous");
    }

    let (status, body) = send(
        &app,
        get_with_auth("/api/v1/auth/whoami", Some(&format!("Bearer {token}"))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["state"], "authenticated");
    assert_eq!(body["data"]["user_id"], user_id);
    assert_eq!(body["data"]["username"], "frank");
}

#[tokio::test]
async fn test_bad_request_bodies_use_error_envelope() {
    let app = create_router(test_state());

    let (status, body) = send(
        &app,
        post_json(
            "/api/v1/auth/register",
            json!({"username": "bob", "password": "pa55word"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "JSON_001");

    let (status, body) = send(&app, post_json("/api/v1/auth/login", json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "JSON_001");

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("not json"))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "JSON_001");
}

#[tokio::test]
async fn test_refresh_flow() {
    let app = create_router(test_state());
    let (user_id, token) = register_and_login(&app, "grace", "pa55word").await;

    let (status, body) = send(
        &app,
        post_with_auth("/api/v1/token/refresh", Some(&format!("Bearer {token}"))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let fresh = body["data"]["token"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        get_with_auth("/api/v1/user/profile", Some(&format!("Bearer {fresh}"))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], user_id);
}

#[tokio::test]
async fn test_refresh_rejects_missing_and_expired() {
    let app = create_router(test_state());
    let (status, body) = send(&app, post_with_auth("/api/v1/token/refresh", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "AUTH_001");

    let expired = issue_session(
        1,
        "ghost",
        &SECRET.into(),
        Duration::from_secs(60),
        SessionValidator::now() - 61,
    );
    let (status, body) = send(
        &app,
        post_with_auth("/api/v1/token/refresh", Some(&format!("Bearer {expired}"))),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "AUTH_005");
    assert!(body["data"].is_null());
}

#[tokio::test]
async fn test_profile_of_vanished_user_is_not_found() {
    let app = create_router(test_state());
    let token = issue_session(
        4242,
        "phantom",
        &SECRET.into(),
        Duration::from_secs(600),
        SessionValidator::now(),
    );
    let (status, body) = send(
        &app,
        get_with_auth("/api/v1/user/profile", Some(&format!("Bearer {token}"))),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NF_001");
}

#[tokio::test]
async fn test_seeded_admin_can_log_in() {
    let state = test_state();
    assert!(state.auth.seed_admin("admin123").await.unwrap());
    let app = create_router(state);

    let (status, body) = send(
        &app,
        post_json(
            "/api/v1/auth/login",
            json!({"username": "admin", "password": "admin123"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["username"], "admin");
    assert_eq!(body["data"]["user"]["email"], "admin@example.com");
}
