// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use serde_json::Value;
use std::sync::Arc;
use tea_map::config::Config;
use tea_map::db::Db;
use tea_map::middleware::auth::create_jwt;
use tea_map::models::{NewUser, PrivacyLevel};
use tea_map::routes::create_router;
use tea_map::AppState;
use tower::ServiceExt;

/// Create a test app over an in-memory database.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with(Config::test_default())
}

#[allow(dead_code)]
pub fn create_test_app_with(config: Config) -> (axum::Router, Arc<AppState>) {
    let db = Db::open_in_memory().expect("in-memory database");
    let state = Arc::new(AppState::new(config, db));
    (create_router(state.clone()), state)
}

/// Insert a user directly and return its id.
#[allow(dead_code)]
pub fn create_user(state: &AppState, username: &str, privacy: PrivacyLevel) -> i64 {
    state
        .db
        .create_user(&NewUser {
            email: Some(format!("{}@example.com", username)),
            username: username.to_string(),
            display_name: Some(username.to_string()),
            privacy_level: privacy,
            ..Default::default()
        })
        .expect("create user")
        .id
}

/// Create a session JWT for testing.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: i64, signing_key: &[u8]) -> String {
    create_jwt(user_id, signing_key, 7).expect("JWT creation")
}

/// A user with a ready-made bearer token.
#[allow(dead_code)]
pub struct TestUser {
    pub id: i64,
    pub username: String,
    pub token: String,
}

#[allow(dead_code)]
pub fn test_user(state: &AppState, username: &str, privacy: PrivacyLevel) -> TestUser {
    let id = create_user(state, username, privacy);
    TestUser {
        id,
        username: username.to_string(),
        token: create_test_jwt(id, &state.config.jwt_signing_key),
    }
}

/// Send one request, optionally authenticated and with a JSON body.
#[allow(dead_code)]
pub async fn send(
    app: &axum::Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    app.clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap()
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

/// Send and decode in one step.
#[allow(dead_code)]
pub async fn call(
    app: &axum::Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let response = send(app, method, uri, token, body).await;
    let status = response.status();
    (status, body_json(response).await)
}

/// Create an activity through the API and return its id.
#[allow(dead_code)]
pub async fn create_activity(app: &axum::Router, user: &TestUser, body: Value) -> i64 {
    let (status, json) = call(app, Method::POST, "/api/activities", Some(&user.token), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "create activity: {}", json);
    json["data"]["id"].as_i64().unwrap()
}

/// Ids of the items in a paginated response, in order.
#[allow(dead_code)]
pub fn item_ids(json: &Value) -> Vec<i64> {
    json["data"]["items"]
        .as_array()
        .map(|items| items.iter().filter_map(|i| i["id"].as_i64()).collect())
        .unwrap_or_default()
}
