// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tea activity model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::media::{Media, MediaInput};
use crate::models::spot::SpotSummary;
use crate::models::user::{PrivacyLevel, UserSummary};

/// Activity row joined with its owner, spot and aggregate counts.
#[derive(Debug, Clone)]
pub struct ActivityRecord {
    pub id: i64,
    pub user_id: i64,
    pub spot_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub tea_type: Option<String>,
    pub duration_minutes: Option<i64>,
    pub privacy_level: PrivacyLevel,
    pub created_at: String,
    pub updated_at: String,
    pub owner: UserSummary,
    pub spot: Option<SpotSummary>,
    pub like_count: u32,
    pub comment_count: u32,
}

/// Fields needed to insert an activity.
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub user_id: i64,
    pub spot_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub tea_type: Option<String>,
    pub duration_minutes: Option<i64>,
    pub privacy_level: PrivacyLevel,
    pub created_at: DateTime<Utc>,
}

/// Partial update; `None` leaves a field unchanged. For the nullable
/// columns `Some(None)` clears the value.
#[derive(Debug, Clone, Default)]
pub struct ActivityChanges {
    pub spot_id: Option<Option<i64>>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub tea_type: Option<String>,
    pub duration_minutes: Option<Option<i64>>,
    pub privacy_level: Option<PrivacyLevel>,
}

/// Body of `POST /api/activities`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CreateActivityRequest {
    #[cfg_attr(feature = "binding-generation", ts(type = "number | null"))]
    pub spot_id: Option<i64>,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(max = 100))]
    pub tea_type: Option<String>,
    #[validate(range(min = 1, max = 1440))]
    #[cfg_attr(feature = "binding-generation", ts(type = "number | null"))]
    pub duration_minutes: Option<i64>,
    #[serde(default)]
    pub privacy_level: PrivacyLevel,
    #[validate(length(max = 10), nested)]
    pub photos: Option<Vec<MediaInput>>,
}

/// Body of `PUT /api/activities/{id}`. Absent fields are left unchanged;
/// an explicit `null` for `spot_id` or `duration_minutes` clears it.
/// `photos`, when present, replaces every existing photo.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UpdateActivityRequest {
    #[serde(default, deserialize_with = "explicit_null")]
    #[cfg_attr(feature = "binding-generation", ts(optional, type = "number | null"))]
    pub spot_id: Option<Option<i64>>,
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(max = 100))]
    pub tea_type: Option<String>,
    #[serde(default, deserialize_with = "explicit_null")]
    #[validate(range(min = 1, max = 1440))]
    #[cfg_attr(feature = "binding-generation", ts(optional, type = "number | null"))]
    pub duration_minutes: Option<Option<i64>>,
    pub privacy_level: Option<PrivacyLevel>,
    #[validate(length(max = 10), nested)]
    pub photos: Option<Vec<MediaInput>>,
}

/// Present-but-null becomes `Some(None)`; a missing field stays `None`
/// through `#[serde(default)]`.
fn explicit_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Body of the comment create and edit endpoints.
#[derive(Debug, Clone, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CommentRequest {
    #[validate(length(min = 1, max = 1000))]
    pub content: String,
}

/// Minimal per-activity data used by the statistics aggregator.
#[derive(Debug, Clone)]
pub struct ActivityFacts {
    pub created_at: DateTime<Utc>,
    pub tea_type: Option<String>,
    pub duration_minutes: Option<i64>,
}

/// Comment with its author.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CommentView {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: i64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub activity_id: i64,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
    pub user: UserSummary,
}

/// Like with the user who gave it.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LikeView {
    pub user: UserSummary,
    pub created_at: String,
}

/// Feed item.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ActivityView {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub tea_type: Option<String>,
    #[cfg_attr(feature = "binding-generation", ts(type = "number | null"))]
    pub duration_minutes: Option<i64>,
    pub privacy_level: PrivacyLevel,
    pub created_at: String,
    pub updated_at: String,
    pub user: UserSummary,
    pub spot: Option<SpotSummary>,
    pub media: Vec<Media>,
    /// Up to two most recent comments, newest first
    pub comments: Vec<CommentView>,
    pub like_count: u32,
    pub comment_count: u32,
    pub is_liked: bool,
}

impl ActivityView {
    pub fn from_record(
        record: ActivityRecord,
        media: Vec<Media>,
        comments: Vec<CommentView>,
        is_liked: bool,
    ) -> Self {
        Self {
            id: record.id,
            title: record.title,
            description: record.description,
            tea_type: record.tea_type,
            duration_minutes: record.duration_minutes,
            privacy_level: record.privacy_level,
            created_at: record.created_at,
            updated_at: record.updated_at,
            user: record.owner,
            spot: record.spot,
            media,
            comments,
            like_count: record.like_count,
            comment_count: record.comment_count,
            is_liked,
        }
    }
}

/// Single-activity payload: full comment and like lists.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ActivityDetail {
    #[serde(flatten)]
    pub activity: ActivityView,
    pub likes: Vec<LikeView>,
}

/// Result of a like toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LikeToggle {
    pub liked: bool,
    pub like_count: u32,
}
