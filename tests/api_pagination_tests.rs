// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API pagination tests.
//!
//! These tests verify that:
//! 1. Pagination parameters are validated (no zero or negative pages)
//! 2. `limit` is capped
//! 3. Walking every page visits each activity exactly once, newest first

use axum::http::{Method, StatusCode};
use serde_json::json;
use tea_map::models::PrivacyLevel;

mod common;

use common::{call, create_activity, item_ids, test_user};

#[tokio::test]
async fn test_page_zero_rejected() {
    let (app, _) = common::create_test_app();

    for uri in [
        "/api/activities?page=0",
        "/api/activities?page=-3",
        "/api/activities?limit=0",
        "/api/spots?limit=-1",
        "/api/users/anyone/followers?page=0",
    ] {
        let (status, body) = call(&app, Method::GET, uri, None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["code"], "VALIDATION_ERROR", "{}", uri);
    }
}

#[tokio::test]
async fn test_non_numeric_page_rejected_with_envelope() {
    let (app, _) = common::create_test_app();
    let (status, body) = call(&app, Method::GET, "/api/activities?page=abc", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["path"], "/api/activities");
}

#[tokio::test]
async fn test_limit_is_capped() {
    let (app, _) = common::create_test_app();
    let (status, body) = call(&app, Method::GET, "/api/activities?limit=5000", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["pagination"]["limit"], 100);
}

#[tokio::test]
async fn test_pages_cover_every_activity_once() {
    let (app, state) = common::create_test_app();
    let user = test_user(&state, "walker", PrivacyLevel::Public);

    let mut created = Vec::new();
    for n in 0..7 {
        created.push(create_activity(&app, &user, json!({"title": format!("Session {}", n)})).await);
    }
    created.reverse();

    let (_, first) = call(&app, Method::GET, "/api/activities?page=1&limit=3", None, None).await;
    assert_eq!(first["data"]["pagination"]["total"], 7);
    assert_eq!(first["data"]["pagination"]["pages"], 3);

    let mut seen = Vec::new();
    for page in 1..=3 {
        let (status, body) = call(
            &app,
            Method::GET,
            &format!("/api/activities?page={}&limit=3", page),
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        seen.extend(item_ids(&body));
    }
    assert_eq!(seen, created);

    let (_, beyond) = call(&app, Method::GET, "/api/activities?page=4&limit=3", None, None).await;
    assert!(item_ids(&beyond).is_empty());
}
