// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User profile and follow routes.

use crate::db::{run_blocking, Db, FeedScope};
use crate::error::{AppError, Result};
use crate::middleware::{AuthUser, Viewer};
use crate::models::{
    is_valid_username, normalize_username, Page, PageParams, PageRequest, UpdateProfileRequest,
    User, UserChanges, UserProfile, UserSummary,
};
use crate::routes::{ApiPath, ApiQuery, ApiResponse, ValidatedJson};
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use std::sync::Arc;

/// Mounted under `/api`.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users/profile", put(update_profile))
        .route("/users/{username}", get(get_profile))
        .route(
            "/users/{username}/follow",
            post(follow_user).delete(unfollow_user),
        )
        .route("/users/{username}/followers", get(list_followers))
        .route("/users/{username}/following", get(list_following))
}

fn find_user(db: &Db, username: &str) -> Result<User> {
    db.get_user_by_username(username)?
        .ok_or_else(|| AppError::NotFound(format!("User '{}' not found", username)))
}

fn build_profile(db: &Db, viewer: Option<i64>, user: User) -> Result<UserProfile> {
    let is_following = match viewer {
        Some(v) if v != user.id => db.is_following(v, user.id)?,
        _ => false,
    };

    Ok(UserProfile {
        follower_count: db.count_followers(user.id)?,
        following_count: db.count_following(user.id)?,
        spot_count: db.count_spots_by_creator(user.id)?,
        activity_count: db.count_feed(viewer, FeedScope::User(user.id))?,
        is_following,
        id: user.id,
        username: user.username,
        display_name: user.display_name,
        avatar_url: user.avatar_url,
        bio: user.bio,
        privacy_level: user.privacy_level,
        created_at: user.created_at,
    })
}

// ─── Profiles ────────────────────────────────────────────────

async fn get_profile(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    ApiPath(username): ApiPath<String>,
) -> Result<Json<ApiResponse<UserProfile>>> {
    let viewer_id = viewer.id();
    let profile = run_blocking(move || {
        let user = find_user(&state.db, &normalize_username(&username))?;
        build_profile(&state.db, viewer_id, user)
    })
    .await?;
    Ok(ApiResponse::ok("Profile retrieved", profile))
}

async fn update_profile(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<UserProfile>>> {
    let username = match request.username.as_deref().map(normalize_username) {
        Some(name) if !is_valid_username(&name) => {
            return Err(AppError::validation(
                "username must be 3-30 characters of a-z, 0-9 or _",
            ));
        }
        other => other,
    };

    let user_id = user.id();
    let current = user.0.username;
    let changes = UserChanges {
        username,
        display_name: request.display_name.map(|v| v.trim().to_string()),
        bio: request.bio,
        avatar_url: request.avatar_url,
        privacy_level: request.privacy_level,
    };

    let profile = run_blocking(move || {
        if let Some(name) = changes.username.as_deref().filter(|n| *n != current) {
            if state.db.get_user_by_username(name)?.is_some() {
                return Err(AppError::Conflict(format!(
                    "Username '{}' is already taken",
                    name
                )));
            }
        }

        let updated = state.db.update_user(user_id, &changes)?;
        build_profile(&state.db, Some(user_id), updated)
    })
    .await?;
    tracing::info!(user_id, "Profile updated");

    Ok(ApiResponse::ok("Profile updated", profile))
}

// ─── Follows ─────────────────────────────────────────────────

async fn follow_user(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ApiPath(username): ApiPath<String>,
) -> Result<(StatusCode, Json<ApiResponse<()>>)> {
    let user_id = user.id();
    let target_id = run_blocking(move || {
        let target = find_user(&state.db, &normalize_username(&username))?;
        if target.id == user_id {
            return Err(AppError::validation("You cannot follow yourself"));
        }

        state.db.follow(user_id, target.id).map_err(|e| match e {
            AppError::Conflict(_) => {
                AppError::Conflict(format!("Already following '{}'", target.username))
            }
            other => other,
        })?;
        Ok(target.id)
    })
    .await?;
    tracing::info!(follower_id = user_id, following_id = target_id, "Followed user");
    Ok(ApiResponse::created("User followed", ()))
}

async fn unfollow_user(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ApiPath(username): ApiPath<String>,
) -> Result<Json<ApiResponse<()>>> {
    let user_id = user.id();
    let target_id = run_blocking(move || {
        let target = find_user(&state.db, &normalize_username(&username))?;
        if !state.db.unfollow(user_id, target.id)? {
            return Err(AppError::NotFound(format!(
                "Not following '{}'",
                target.username
            )));
        }
        Ok(target.id)
    })
    .await?;
    tracing::info!(follower_id = user_id, following_id = target_id, "Unfollowed user");
    Ok(ApiResponse::ok("User unfollowed", ()))
}

async fn list_followers(
    State(state): State<Arc<AppState>>,
    ApiPath(username): ApiPath<String>,
    ApiQuery(params): ApiQuery<PageParams>,
) -> Result<Json<ApiResponse<Page<UserSummary>>>> {
    let page = PageRequest::from_params(params)?;
    let users = run_blocking(move || {
        let target = find_user(&state.db, &normalize_username(&username))?;
        let users = state
            .db
            .list_followers(target.id, page.limit, page.offset())?;
        let total = state.db.count_followers(target.id)?;
        Ok(Page::new(users, page, total))
    })
    .await?;
    Ok(ApiResponse::ok("Followers retrieved", users))
}

async fn list_following(
    State(state): State<Arc<AppState>>,
    ApiPath(username): ApiPath<String>,
    ApiQuery(params): ApiQuery<PageParams>,
) -> Result<Json<ApiResponse<Page<UserSummary>>>> {
    let page = PageRequest::from_params(params)?;
    let users = run_blocking(move || {
        let target = find_user(&state.db, &normalize_username(&username))?;
        let users = state
            .db
            .list_following(target.id, page.limit, page.offset())?;
        let total = state.db.count_following(target.id)?;
        Ok(Page::new(users, page, total))
    })
    .await?;
    Ok(ApiResponse::ok("Following retrieved", users))
}
