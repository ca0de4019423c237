// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod feed;
pub mod google;
pub mod privacy;
pub mod spots;
pub mod stats;

pub use feed::FeedService;
pub use google::{upsert_google_user, GoogleOAuthClient, GoogleUserInfo};
pub use spots::{SpotQuery, SpotService};
pub use stats::StatsService;
