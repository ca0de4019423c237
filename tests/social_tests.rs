// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Likes, comments and follows through the HTTP API.

use axum::http::{Method, StatusCode};
use serde_json::json;
use tea_map::models::PrivacyLevel;

mod common;

use common::{call, create_activity, test_user};

// ─── Likes ───────────────────────────────────────────────────

#[tokio::test]
async fn test_like_toggle_twice_restores_state() {
    let (app, state) = common::create_test_app();
    let owner = test_user(&state, "owner", PrivacyLevel::Public);
    let fan = test_user(&state, "fan", PrivacyLevel::Public);
    let id = create_activity(&app, &owner, json!({"title": "Matcha"})).await;
    let uri = format!("/api/activities/{}/like", id);

    let (status, first) = call(&app, Method::POST, &uri, Some(&fan.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["data"], json!({"liked": true, "like_count": 1}));

    let (_, detail) = call(&app, Method::GET, &format!("/api/activities/{}", id), Some(&fan.token), None).await;
    assert_eq!(detail["data"]["is_liked"], true);
    assert_eq!(detail["data"]["likes"][0]["user"]["username"], "fan");

    let (_, second) = call(&app, Method::POST, &uri, Some(&fan.token), None).await;
    assert_eq!(second["data"], json!({"liked": false, "like_count": 0}));
}

#[tokio::test]
async fn test_concurrent_like_toggles_never_duplicate() {
    let (app, state) = common::create_test_app();
    let owner = test_user(&state, "owner", PrivacyLevel::Public);
    let fan = test_user(&state, "fan", PrivacyLevel::Public);
    let id = create_activity(&app, &owner, json!({"title": "Sencha"})).await;
    let uri = format!("/api/activities/{}/like", id);

    let mut handles = Vec::new();
    for _ in 0..9 {
        let app = app.clone();
        let uri = uri.clone();
        let token = fan.token.clone();
        handles.push(tokio::spawn(async move {
            call(&app, Method::POST, &uri, Some(&token), None).await.0
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), StatusCode::OK);
    }

    let (_, detail) = call(&app, Method::GET, &format!("/api/activities/{}", id), None, None).await;
    // Nine toggles from the same user end liked, with exactly one row.
    assert_eq!(detail["data"]["like_count"], 1);
    assert_eq!(detail["data"]["likes"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_like_requires_visibility_and_auth() {
    let (app, state) = common::create_test_app();
    let owner = test_user(&state, "owner", PrivacyLevel::Public);
    let other = test_user(&state, "other", PrivacyLevel::Public);
    let id = create_activity(&app, &owner, json!({"title": "Mine", "privacy_level": "private"})).await;
    let uri = format!("/api/activities/{}/like", id);

    let (status, body) = call(&app, Method::POST, &uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = call(&app, Method::POST, &uri, Some(&other.token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_feed_reports_viewer_likes() {
    let (app, state) = common::create_test_app();
    let owner = test_user(&state, "owner", PrivacyLevel::Public);
    let fan = test_user(&state, "fan", PrivacyLevel::Public);
    let liked = create_activity(&app, &owner, json!({"title": "Liked"})).await;
    create_activity(&app, &owner, json!({"title": "Not liked"})).await;

    call(&app, Method::POST, &format!("/api/activities/{}/like", liked), Some(&fan.token), None).await;

    let (_, feed) = call(&app, Method::GET, "/api/activities", Some(&fan.token), None).await;
    for item in feed["data"]["items"].as_array().unwrap() {
        let expected = item["id"].as_i64() == Some(liked);
        assert_eq!(item["is_liked"], expected);
    }

    let (_, anon) = call(&app, Method::GET, "/api/activities", None, None).await;
    assert!(anon["data"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .all(|i| i["is_liked"] == false));
}

// ─── Comments ────────────────────────────────────────────────

#[tokio::test]
async fn test_comment_author_gating() {
    let (app, state) = common::create_test_app();
    let owner = test_user(&state, "owner", PrivacyLevel::Public);
    let author = test_user(&state, "author", PrivacyLevel::Public);
    let stranger = test_user(&state, "stranger", PrivacyLevel::Public);
    let id = create_activity(&app, &owner, json!({"title": "Chat"})).await;

    let (status, comment) = call(
        &app,
        Method::POST,
        &format!("/api/activities/{}/comments", id),
        Some(&author.token),
        Some(json!({"content": "Lovely"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let comment_id = comment["data"]["id"].as_i64().unwrap();
    let comment_uri = format!("/api/activities/{}/comments/{}", id, comment_id);

    let (status, _) = call(&app, Method::PUT, &comment_uri, Some(&stranger.token), Some(json!({"content": "Hijack"}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Even the activity owner cannot edit someone else's comment.
    let (status, _) = call(&app, Method::DELETE, &comment_uri, Some(&owner.token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, updated) = call(&app, Method::PUT, &comment_uri, Some(&author.token), Some(json!({"content": "Lovely indeed"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["data"]["content"], "Lovely indeed");

    // Comment must belong to the activity named in the path.
    let other_activity = create_activity(&app, &owner, json!({"title": "Other"})).await;
    let wrong = format!("/api/activities/{}/comments/{}", other_activity, comment_id);
    let (status, _) = call(&app, Method::DELETE, &wrong, Some(&author.token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&app, Method::DELETE, &comment_uri, Some(&author.token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(&app, Method::DELETE, &comment_uri, Some(&author.token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_comment_list_is_paginated_and_ascending() {
    let (app, state) = common::create_test_app();
    let owner = test_user(&state, "owner", PrivacyLevel::Public);
    let id = create_activity(&app, &owner, json!({"title": "Thread"})).await;

    for n in 1..=3 {
        call(
            &app,
            Method::POST,
            &format!("/api/activities/{}/comments", id),
            Some(&owner.token),
            Some(json!({"content": format!("c{}", n)})),
        )
        .await;
    }

    let (status, page) = call(&app, Method::GET, &format!("/api/activities/{}/comments?limit=2", id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    let contents: Vec<&str> = page["data"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["content"].as_str().unwrap())
        .collect();
    assert_eq!(contents, vec!["c1", "c2"]);
    assert_eq!(page["data"]["pagination"]["pages"], 2);
}

#[tokio::test]
async fn test_comment_validation() {
    let (app, state) = common::create_test_app();
    let owner = test_user(&state, "owner", PrivacyLevel::Public);
    let id = create_activity(&app, &owner, json!({"title": "Quiet"})).await;
    let uri = format!("/api/activities/{}/comments", id);

    let (status, body) = call(&app, Method::POST, &uri, Some(&owner.token), Some(json!({"content": ""}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["details"]["content"].is_array());

    let (status, _) = call(&app, Method::POST, &uri, Some(&owner.token), Some(json!({"content": "x".repeat(1001)}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(&app, Method::POST, &uri, Some(&owner.token), Some(json!({"content": "   "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_comments_on_hidden_activity_are_forbidden() {
    let (app, state) = common::create_test_app();
    let owner = test_user(&state, "owner", PrivacyLevel::Public);
    let other = test_user(&state, "other", PrivacyLevel::Public);
    let id = create_activity(&app, &owner, json!({"title": "Alone", "privacy_level": "friends"})).await;
    let uri = format!("/api/activities/{}/comments", id);

    let (status, _) = call(&app, Method::GET, &uri, Some(&other.token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = call(&app, Method::POST, &uri, Some(&other.token), Some(json!({"content": "hi"}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

// ─── Follows ─────────────────────────────────────────────────

#[tokio::test]
async fn test_follow_rules() {
    let (app, state) = common::create_test_app();
    let a = test_user(&state, "alice", PrivacyLevel::Public);
    test_user(&state, "bob", PrivacyLevel::Public);

    let (status, _) = call(&app, Method::POST, "/api/users/alice/follow", Some(&a.token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(&app, Method::POST, "/api/users/ghost/follow", Some(&a.token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&app, Method::POST, "/api/users/bob/follow", Some(&a.token), None).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = call(&app, Method::POST, "/api/users/bob/follow", Some(&a.token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (_, followers) = call(&app, Method::GET, "/api/users/bob/followers", None, None).await;
    assert_eq!(followers["data"]["items"][0]["username"], "alice");
    assert_eq!(followers["data"]["pagination"]["total"], 1);

    let (_, following) = call(&app, Method::GET, "/api/users/alice/following", None, None).await;
    assert_eq!(following["data"]["items"][0]["username"], "bob");

    let (_, profile) = call(&app, Method::GET, "/api/users/bob", Some(&a.token), None).await;
    assert_eq!(profile["data"]["follower_count"], 1);
    assert_eq!(profile["data"]["is_following"], true);

    let (status, _) = call(&app, Method::DELETE, "/api/users/bob/follow", Some(&a.token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(&app, Method::DELETE, "/api/users/bob/follow", Some(&a.token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
