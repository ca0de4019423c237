// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Photo attachments for activities and spots.

use serde::{Deserialize, Serialize};
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Stored media row. Belongs to exactly one activity or one spot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Media {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: i64,
    #[serde(skip)]
    pub activity_id: Option<i64>,
    #[serde(skip)]
    pub spot_id: Option<i64>,
    /// Hosted URL of the file
    pub file_path: String,
    /// MIME type, e.g. "image/jpeg"
    pub file_type: String,
    pub created_at: String,
}

/// Photo reference supplied by the client (already uploaded elsewhere).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MediaInput {
    #[validate(length(min = 1, max = 500))]
    pub file_path: String,
    #[validate(length(min = 1, max = 50))]
    pub file_type: String,
}

/// Which parent a media row is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaOwner {
    Activity(i64),
    Spot(i64),
}
