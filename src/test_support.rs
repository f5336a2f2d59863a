//! Helpers for driving the router in handler tests.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use crate::{app::build_app, state::AppState};

pub fn test_app() -> Router {
    build_app(AppState::fake())
}

pub fn app_with_state(state: AppState) -> Router {
    build_app(state)
}

/// Sends one request; empty bodies come back as `Value::Null`, non-JSON as a string.
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
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
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}

/// Registers `<username>@example.com` with password `password123`.
/// Returns the access token and user id.
pub async fn register(app: &Router, username: &str) -> (String, Uuid) {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "email": format!("{username}@example.com"),
            "username": username,
            "password": "password123",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    let token = body["accessToken"].as_str().unwrap().to_string();
    let id = body["user"]["id"].as_str().unwrap().parse().unwrap();
    (token, id)
}

#[tokio::test]
async fn health_is_ok() {
    let app = test_app();
    let (status, body) = send(&app, Method::GET, "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("ok".into()));
}
