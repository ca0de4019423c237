// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod activity;
pub mod media;
pub mod page;
pub mod spot;
pub mod stats;
pub mod user;

pub use activity::{
    ActivityChanges, ActivityDetail, ActivityFacts, ActivityRecord, ActivityView, CommentRequest,
    CommentView, CreateActivityRequest, LikeToggle, LikeView, NewActivity, UpdateActivityRequest,
};
pub use media::{Media, MediaInput, MediaOwner};
pub use page::{Page, PageInfo, PageParams, PageRequest};
pub use spot::{
    CreateSpotRequest, NewSpot, SpotChanges, SpotDetail, SpotRecord, SpotSummary, SpotView,
    UpdateSpotRequest,
};
pub use stats::{CommunityStats, DashboardStats, PopularSpot, UserStats, WeeklyStats};
pub use user::{
    is_valid_username, normalize_username, normalize_username_base, NewUser, PrivacyLevel, User,
    UpdateProfileRequest, UserChanges, UserProfile, UserSummary,
};
