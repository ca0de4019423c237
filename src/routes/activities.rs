// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity feed routes.

use crate::db::{run_blocking, FeedScope};
use crate::error::Result;
use crate::middleware::{AuthUser, Viewer};
use crate::models::{
    ActivityDetail, ActivityView, CreateActivityRequest, LikeToggle, Page, PageParams,
    PageRequest, UpdateActivityRequest,
};
use crate::routes::{ApiPath, ApiQuery, ApiResponse, ValidatedJson};
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

/// Mounted under `/api`.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/activities", get(list_activities).post(create_activity))
        .route(
            "/activities/{id}",
            get(get_activity).put(update_activity).delete(delete_activity),
        )
        .route("/activities/{id}/like", post(toggle_like))
        .route("/activities/spot/{spot_id}", get(list_spot_activities))
        .route("/activities/user/{username}", get(list_user_activities))
}

// ─── Feeds ───────────────────────────────────────────────────

async fn list_activities(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    ApiQuery(params): ApiQuery<PageParams>,
) -> Result<Json<ApiResponse<Page<ActivityView>>>> {
    let page = PageRequest::from_params(params)?;
    let viewer_id = viewer.id();
    let feed = run_blocking(move || {
        state
            .feed
            .list_activities(viewer_id, FeedScope::Global, page)
    })
    .await?;
    Ok(ApiResponse::ok("Activities retrieved", feed))
}

async fn list_spot_activities(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    ApiPath(spot_id): ApiPath<i64>,
    ApiQuery(params): ApiQuery<PageParams>,
) -> Result<Json<ApiResponse<Page<ActivityView>>>> {
    let page = PageRequest::from_params(params)?;
    let viewer_id = viewer.id();
    let feed =
        run_blocking(move || state.feed.list_spot_activities(viewer_id, spot_id, page)).await?;
    Ok(ApiResponse::ok("Spot activities retrieved", feed))
}

async fn list_user_activities(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    ApiPath(username): ApiPath<String>,
    ApiQuery(params): ApiQuery<PageParams>,
) -> Result<Json<ApiResponse<Page<ActivityView>>>> {
    let page = PageRequest::from_params(params)?;
    let viewer_id = viewer.id();
    let feed = run_blocking(move || {
        state
            .feed
            .list_user_activities(viewer_id, &username.to_lowercase(), page)
    })
    .await?;
    Ok(ApiResponse::ok("User activities retrieved", feed))
}

// ─── Single Activity ─────────────────────────────────────────

async fn get_activity(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ApiResponse<ActivityDetail>>> {
    let viewer_id = viewer.id();
    let activity = run_blocking(move || state.feed.get_activity(viewer_id, id)).await?;
    Ok(ApiResponse::ok("Activity retrieved", activity))
}

async fn create_activity(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<CreateActivityRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ActivityDetail>>)> {
    let user_id = user.id();
    let activity = run_blocking(move || state.feed.create_activity(user_id, request)).await?;
    tracing::info!(
        user_id,
        activity_id = activity.activity.id,
        "Activity created"
    );
    Ok(ApiResponse::created("Activity created", activity))
}

async fn update_activity(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ValidatedJson(request): ValidatedJson<UpdateActivityRequest>,
) -> Result<Json<ApiResponse<ActivityDetail>>> {
    let user_id = user.id();
    let activity =
        run_blocking(move || state.feed.update_activity(user_id, id, request)).await?;
    Ok(ApiResponse::ok("Activity updated", activity))
}

async fn delete_activity(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ApiResponse<()>>> {
    let user_id = user.id();
    run_blocking(move || state.feed.delete_activity(user_id, id)).await?;
    tracing::info!(user_id, activity_id = id, "Activity deleted");
    Ok(ApiResponse::ok("Activity deleted", ()))
}

async fn toggle_like(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ApiResponse<LikeToggle>>> {
    let user_id = user.id();
    let toggle = run_blocking(move || state.feed.toggle_like(user_id, id)).await?;
    let message = if toggle.liked {
        "Activity liked"
    } else {
        "Activity unliked"
    };
    Ok(ApiResponse::ok(message, toggle))
}
