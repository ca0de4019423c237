// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tea Map: a map of tea spots and the sessions logged at them.
//!
//! This crate provides the backend API: spots, a privacy-scoped activity
//! feed with likes and comments, follows, statistics, and Google sign-in.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Db;
use middleware::RateLimiter;
use services::{FeedService, GoogleOAuthClient, SpotService, StatsService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Db,
    pub feed: FeedService,
    pub stats: StatsService,
    pub spots: SpotService,
    pub google: GoogleOAuthClient,
    pub rate_limiter: RateLimiter,
}

impl AppState {
    /// Wire every service to the one shared database handle.
    pub fn new(config: Config, db: Db) -> Self {
        let feed = FeedService::new(db.clone());
        let google = GoogleOAuthClient::new(
            config.google_client_id.clone(),
            config.google_client_secret.clone(),
        );
        let rate_limiter =
            RateLimiter::new(config.rate_limit_max_requests, config.rate_limit_window_secs);

        Self {
            stats: StatsService::new(db.clone()),
            spots: SpotService::new(db.clone(), feed.clone()),
            feed,
            google,
            rate_limiter,
            db,
            config,
        }
    }
}
