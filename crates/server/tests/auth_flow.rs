use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use server::{build_router, AppState};
use service::auth::repository::mock::MockAuthRepository;
use service::auth::service::AuthConfig;
use service::notify::mock::RecordingNotifier;
use service::storage::MemoryFileStore;
use service::{Backends, Services};

fn cors() -> tower_http::cors::CorsLayer { tower_http::cors::CorsLayer::very_permissive() }

fn build_app() -> Router {
    let services = Services::new(
        Backends::in_memory(Arc::new(MockAuthRepository::default())),
        AuthConfig { jwt_secret: Some("auth-flow-test-secret".into()), ..AuthConfig::default() },
        Arc::new(MemoryFileStore::default()),
        Arc::new(RecordingNotifier::default()),
        None,
    );
    build_router(AppState::new(services), cors())
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Vec<(String, String)>, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let headers = resp
        .headers()
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or_default().to_string()))
        .collect();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, headers, body)
}

fn json_req(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut b = Request::builder().method(method).uri(uri).header(header::CONTENT_TYPE, "application/json");
    if let Some(t) = token {
        b = b.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    b.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut b = Request::builder().method(Method::GET).uri(uri);
    if let Some(t) = token {
        b = b.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    b.body(Body::empty()).unwrap()
}

/// Bootstrap a tenant and log its admin in; returns (tenant_id, token).
async fn admin_session(app: &Router) -> (String, String) {
    let (status, _, admin) = send(
        app,
        json_req(
            Method::POST,
            "/auth/bootstrap",
            None,
            json!({"tenant_name": "Acme Capital", "email": "admin@acme.io", "name": "Ada", "password": "Passw0rd!"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let tenant_id = admin["tenant_id"].as_str().unwrap().to_string();
    let token = login(app, &tenant_id, "admin@acme.io").await;
    (tenant_id, token)
}

async fn login(app: &Router, tenant_id: &str, email: &str) -> String {
    let (status, _, body) = send(
        app,
        json_req(Method::POST, "/auth/login", None, json!({"tenant_id": tenant_id, "email": email, "password": "Passw0rd!"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_and_metrics_are_public() {
    let app = build_app();
    let (status, _, body) = send(&app, get("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));

    let resp = app.clone().oneshot(get("/metrics", None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn missing_token_is_bad_request_and_invalid_token_unauthorized() {
    let app = build_app();
    let (status, _, _) = send(&app, get("/products", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, _) = send(&app, get("/products", Some("not-a-jwt"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let req = Request::builder()
        .uri("/products")
        .header(header::AUTHORIZATION, "Basic abc")
        .body(Body::empty())
        .unwrap();
    let (status, _, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn preflight_passes_without_token() {
    let app = build_app();
    let req = Request::builder()
        .method(Method::OPTIONS)
        .uri("/products")
        .header(header::ORIGIN, "http://localhost:3000")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert!(resp.status().is_success());
}

#[tokio::test]
async fn login_sets_cookie_that_authenticates() {
    let app = build_app();
    let (tenant_id, _) = admin_session(&app).await;

    let (status, headers, _) = send(
        &app,
        json_req(
            Method::POST,
            "/auth/login",
            None,
            json!({"tenant_id": tenant_id, "email": "admin@acme.io", "password": "Passw0rd!"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let cookie = headers
        .iter()
        .find(|(k, _)| k == "set-cookie")
        .map(|(_, v)| v.clone())
        .expect("auth cookie");
    assert!(cookie.starts_with("auth_token="));
    assert!(cookie.contains("HttpOnly"));
    let pair = cookie.split(';').next().unwrap().to_string();

    let req = Request::builder().uri("/auth/me").header(header::COOKIE, pair).body(Body::empty()).unwrap();
    let (status, _, me) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "admin@acme.io");
    assert_eq!(me["role"], "admin");
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = build_app();
    let (tenant_id, _) = admin_session(&app).await;
    let (status, _, body) = send(
        &app,
        json_req(Method::POST, "/auth/login", None, json!({"tenant_id": tenant_id, "email": "admin@acme.io", "password": "nope-nope"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn only_admins_register_users() {
    let app = build_app();
    let (tenant_id, admin) = admin_session(&app).await;

    let (status, _, user) = send(
        &app,
        json_req(
            Method::POST,
            "/users",
            Some(&admin),
            json!({"email": "carl@client.io", "name": "Carl", "password": "Passw0rd!"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["role"], "client");

    let (status, _, body) = send(
        &app,
        json_req(
            Method::POST,
            "/auth/register",
            Some(&admin),
            json!({"email": "carl@client.io", "name": "Carl Again", "password": "Passw0rd!"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");

    let client = login(&app, &tenant_id, "carl@client.io").await;
    let (status, _, _) = send(
        &app,
        json_req(
            Method::POST,
            "/auth/register",
            Some(&client),
            json!({"email": "eve@client.io", "name": "Eve", "password": "Passw0rd!", "role": "admin"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, _) = send(&app, get("/users", Some(&client))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, users) = send(&app, get("/users?role=client", Some(&admin))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn short_password_is_rejected_with_detail() {
    let app = build_app();
    let (status, _, body) = send(
        &app,
        json_req(
            Method::POST,
            "/auth/bootstrap",
            None,
            json!({"tenant_name": "Tiny", "email": "a@tiny.io", "name": "A", "password": "short"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_failed");
    assert!(body["detail"].as_str().unwrap().contains("password"));
}

#[tokio::test]
async fn uploaded_html_is_served_sandboxed() {
    let app = build_app();
    let (_tenant_id, token) = admin_session(&app).await;
    let upload = Request::builder()
        .method(Method::POST)
        .uri("/files/a.html")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from("<script>fetch('/users')</script>"))
        .unwrap();
    let (status, _, stored) = send(&app, upload).await;
    assert_eq!(status, StatusCode::CREATED);
    let key = stored["key"].as_str().unwrap().to_string();

    let (status, headers, _) = send(&app, get(&format!("/files/{key}"), Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    let header_value = |name: &str| headers.iter().find(|(k, _)| k == name).map(|(_, v)| v.clone());
    assert_eq!(header_value("x-content-type-options").as_deref(), Some("nosniff"));
    let csp = header_value("content-security-policy").unwrap();
    assert!(csp.starts_with("sandbox"));
    assert!(!csp.contains("script-src"));
}
