// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Comment routes, nested under an activity.

use crate::db::run_blocking;
use crate::error::Result;
use crate::middleware::{AuthUser, Viewer};
use crate::models::{CommentRequest, CommentView, Page, PageParams, PageRequest};
use crate::routes::{ApiPath, ApiQuery, ApiResponse, ValidatedJson};
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use std::sync::Arc;

/// Mounted under `/api`.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/activities/{id}/comments",
            get(list_comments).post(add_comment),
        )
        .route(
            "/activities/{id}/comments/{comment_id}",
            put(update_comment).delete(delete_comment),
        )
}

async fn list_comments(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    ApiPath(activity_id): ApiPath<i64>,
    ApiQuery(params): ApiQuery<PageParams>,
) -> Result<Json<ApiResponse<Page<CommentView>>>> {
    let page = PageRequest::from_params(params)?;
    let viewer_id = viewer.id();
    let comments =
        run_blocking(move || state.feed.list_comments(viewer_id, activity_id, page)).await?;
    Ok(ApiResponse::ok("Comments retrieved", comments))
}

async fn add_comment(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ApiPath(activity_id): ApiPath<i64>,
    ValidatedJson(request): ValidatedJson<CommentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CommentView>>)> {
    let user_id = user.id();
    let comment =
        run_blocking(move || state.feed.add_comment(user_id, activity_id, request)).await?;
    Ok(ApiResponse::created("Comment added", comment))
}

async fn update_comment(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ApiPath((activity_id, comment_id)): ApiPath<(i64, i64)>,
    ValidatedJson(request): ValidatedJson<CommentRequest>,
) -> Result<Json<ApiResponse<CommentView>>> {
    let user_id = user.id();
    let comment = run_blocking(move || {
        state
            .feed
            .update_comment(user_id, activity_id, comment_id, request)
    })
    .await?;
    Ok(ApiResponse::ok("Comment updated", comment))
}

async fn delete_comment(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ApiPath((activity_id, comment_id)): ApiPath<(i64, i64)>,
) -> Result<Json<ApiResponse<()>>> {
    let user_id = user.id();
    run_blocking(move || state.feed.delete_comment(user_id, activity_id, comment_id)).await?;
    Ok(ApiResponse::ok("Comment deleted", ()))
}
