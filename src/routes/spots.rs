// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Spot routes.

use crate::db::run_blocking;
use crate::error::Result;
use crate::middleware::{AuthUser, Viewer};
use crate::models::{
    CreateSpotRequest, Page, PageParams, PageRequest, SpotDetail, SpotView, UpdateSpotRequest,
};
use crate::routes::{ApiPath, ApiQuery, ApiResponse, ValidatedJson};
use crate::services::SpotQuery;
use crate::AppState;
use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::sync::Arc;

/// Mounted under `/api`.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/spots", get(list_spots).post(create_spot))
        .route("/spots/geojson", get(spots_geojson))
        .route("/spots/user/{username}", get(list_user_spots))
        .route(
            "/spots/{id}",
            get(get_spot).put(update_spot).delete(delete_spot),
        )
}

/// `?page&limit&search&lat&lng&radius_km`
async fn list_spots(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    ApiQuery(params): ApiQuery<PageParams>,
    ApiQuery(query): ApiQuery<SpotQuery>,
) -> Result<Json<ApiResponse<Page<SpotView>>>> {
    let page = PageRequest::from_params(params)?;
    let viewer_id = viewer.id();
    let spots = run_blocking(move || state.spots.list_spots(viewer_id, &query, page)).await?;
    Ok(ApiResponse::ok("Spots retrieved", spots))
}

/// Bare FeatureCollection so map clients can load it directly.
async fn spots_geojson(State(state): State<Arc<AppState>>, viewer: Viewer) -> Result<Response> {
    let viewer_id = viewer.id();
    let collection = run_blocking(move || state.spots.geojson(viewer_id)).await?;
    let mut response = Json(collection).into_response();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/geo+json"),
    );
    Ok(response)
}

async fn list_user_spots(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    ApiPath(username): ApiPath<String>,
    ApiQuery(params): ApiQuery<PageParams>,
) -> Result<Json<ApiResponse<Page<SpotView>>>> {
    let page = PageRequest::from_params(params)?;
    let viewer_id = viewer.id();
    let spots = run_blocking(move || {
        state
            .spots
            .list_user_spots(viewer_id, &username.to_lowercase(), page)
    })
    .await?;
    Ok(ApiResponse::ok("User spots retrieved", spots))
}

async fn get_spot(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ApiResponse<SpotDetail>>> {
    let viewer_id = viewer.id();
    let spot = run_blocking(move || state.spots.get_spot(viewer_id, id)).await?;
    Ok(ApiResponse::ok("Spot retrieved", spot))
}

async fn create_spot(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<CreateSpotRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SpotView>>)> {
    let user_id = user.id();
    let spot = run_blocking(move || state.spots.create_spot(user_id, request)).await?;
    tracing::info!(user_id, spot_id = spot.id, "Spot created");
    Ok(ApiResponse::created("Spot created", spot))
}

async fn update_spot(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ValidatedJson(request): ValidatedJson<UpdateSpotRequest>,
) -> Result<Json<ApiResponse<SpotView>>> {
    let user_id = user.id();
    let spot = run_blocking(move || state.spots.update_spot(user_id, id, request)).await?;
    Ok(ApiResponse::ok("Spot updated", spot))
}

async fn delete_spot(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ApiResponse<()>>> {
    let user_id = user.id();
    run_blocking(move || state.spots.delete_spot(user_id, id)).await?;
    tracing::info!(user_id, spot_id = id, "Spot deleted");
    Ok(ApiResponse::ok("Spot deleted", ()))
}
