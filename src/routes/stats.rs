// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Statistics routes.

use crate::db::run_blocking;
use crate::error::Result;
use crate::middleware::AuthUser;
use crate::models::{DashboardStats, UserStats};
use crate::routes::{ApiPath, ApiResponse};
use crate::AppState;
use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use std::sync::Arc;

/// Mounted under `/api`.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/stats/dashboard", get(dashboard))
        .route("/stats/user/{user_id}", get(user_stats))
}

async fn dashboard(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<ApiResponse<DashboardStats>>> {
    let user_id = user.id();
    let stats = run_blocking(move || state.stats.dashboard(user_id)).await?;
    Ok(ApiResponse::ok("Dashboard stats retrieved", stats))
}

/// Always reports the caller's own stats; the path segment is not used.
async fn user_stats(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ApiPath(requested): ApiPath<String>,
) -> Result<Json<ApiResponse<UserStats>>> {
    let user_id = user.id();
    if requested != user_id.to_string() {
        tracing::debug!(
            user_id,
            requested = %requested,
            "Stats requested for another user; serving caller's own"
        );
    }
    let stats = run_blocking(move || state.stats.user_stats(user_id)).await?;
    Ok(ApiResponse::ok("User stats retrieved", stats))
}
