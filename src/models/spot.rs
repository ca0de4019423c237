// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tea spot model.

use serde::{Deserialize, Serialize};
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::activity::ActivityView;
use crate::models::media::{Media, MediaInput};
use crate::models::user::{PrivacyLevel, UserSummary};

/// Spot row joined with its creator.
#[derive(Debug, Clone)]
pub struct SpotRecord {
    pub id: i64,
    pub creator_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub creator: UserSummary,
    /// The creator's profile privacy level
    pub creator_privacy: PrivacyLevel,
    pub activity_count: u32,
}

/// Fields needed to insert a spot.
#[derive(Debug, Clone)]
pub struct NewSpot {
    pub creator_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
}

/// Partial update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct SpotChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<String>,
}

/// Body of `POST /api/spots`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CreateSpotRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
    #[validate(length(max = 500))]
    pub address: Option<String>,
    #[validate(length(max = 10), nested)]
    pub photos: Option<Vec<MediaInput>>,
}

/// Body of `PUT /api/spots/{id}`. `photos`, when present, replaces every
/// existing photo in the same transaction as the field update.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UpdateSpotRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
    #[validate(length(max = 500))]
    pub address: Option<String>,
    #[validate(length(max = 10), nested)]
    pub photos: Option<Vec<MediaInput>>,
}

/// Spot fields embedded in an activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SpotSummary {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: i64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
}

/// Spot list item.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SpotView {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub creator: UserSummary,
    pub media: Vec<Media>,
    pub activity_count: u32,
    /// Only present for nearby searches
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

impl SpotView {
    pub fn from_record(record: SpotRecord, media: Vec<Media>, distance_km: Option<f64>) -> Self {
        Self {
            id: record.id,
            name: record.name,
            description: record.description,
            latitude: record.latitude,
            longitude: record.longitude,
            address: record.address,
            created_at: record.created_at,
            updated_at: record.updated_at,
            creator: record.creator,
            media,
            activity_count: record.activity_count,
            distance_km,
        }
    }
}

/// Spot detail with recent visible activities.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SpotDetail {
    #[serde(flatten)]
    pub spot: SpotView,
    pub recent_activities: Vec<ActivityView>,
}
