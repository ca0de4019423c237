// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Statistics aggregator.
//!
//! Everything is recomputed per request. Calendar windows come from the
//! server's local time zone; the rolling 7-day window used for popular
//! spots and active users is independent of the week boundary.

use chrono::{DateTime, Local, TimeZone};

use crate::db::Db;
use crate::error::Result;
use crate::models::{CommunityStats, DashboardStats, UserStats, WeeklyStats};
use crate::time_utils::CalendarWindows;

/// Spots listed on the dashboard.
pub const POPULAR_SPOT_COUNT: u32 = 5;

#[derive(Clone)]
pub struct StatsService {
    db: Db,
}

impl StatsService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Rollup of every activity the user owns.
    pub fn user_stats(&self, user_id: i64) -> Result<UserStats> {
        self.user_stats_at(user_id, &Local::now())
    }

    /// [`StatsService::user_stats`] at a fixed instant.
    pub fn user_stats_at<Tz: TimeZone>(&self, user_id: i64, now: &DateTime<Tz>) -> Result<UserStats> {
        let windows = CalendarWindows::at(now);
        let activities = self.db.activity_facts_for_user(user_id)?;
        let total_spots = self.db.count_spots_by_creator(user_id)?;

        let stats = UserStats::from_activities(&activities, total_spots, &windows);
        tracing::debug!(
            user_id,
            total = stats.total_activities,
            this_week = stats.activities_this_week,
            "Computed user stats"
        );
        Ok(stats)
    }

    /// Dashboard for `viewer_id`.
    pub fn dashboard(&self, viewer_id: i64) -> Result<DashboardStats> {
        self.dashboard_at(viewer_id, &Local::now())
    }

    /// [`StatsService::dashboard`] at a fixed instant.
    pub fn dashboard_at<Tz: TimeZone>(
        &self,
        viewer_id: i64,
        now: &DateTime<Tz>,
    ) -> Result<DashboardStats> {
        let windows = CalendarWindows::at(now);

        let activities = self.db.activity_facts_for_user(viewer_id)?;
        let new_spots = self
            .db
            .count_spots_created_since(viewer_id, windows.week_start)?;
        let weekly_stats = WeeklyStats::from_activities(&activities, new_spots, &windows);

        let popular_spots = self.db.popular_spots(
            Some(viewer_id),
            windows.rolling_week_start,
            POPULAR_SPOT_COUNT,
        )?;

        let community_stats = CommunityStats {
            active_users: self
                .db
                .count_active_users_since(windows.rolling_week_start)?,
            sessions_today: self.db.count_activities_since(windows.day_start)?,
            // Reports the viewer's own figure, not a platform-wide count.
            new_spots_this_week: weekly_stats.new_spots,
        };

        Ok(DashboardStats {
            weekly_stats,
            popular_spots,
            community_stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support;
    use crate::models::PrivacyLevel;
    use chrono::{Duration, Utc};

    // Tuesday 2025-01-14 10:00 UTC.
    fn tuesday() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 14, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_activity_drops_out_of_week_but_not_total() {
        let db = test_support::db();
        let stats = StatsService::new(db.clone());
        let user = test_support::user(&db, "drinker", PrivacyLevel::Public);
        let id = test_support::activity(&db, user, None, PrivacyLevel::Public, tuesday());
        db.update_activity(
            id,
            &crate::models::ActivityChanges {
                duration_minutes: Some(Some(45)),
                ..Default::default()
            },
        )
        .unwrap();

        let same_week = stats.user_stats_at(user, &(tuesday() + Duration::days(2))).unwrap();
        assert_eq!(same_week.activities_this_week, 1);
        assert_eq!(same_week.weekly_duration, 45);

        // Sunday 23:59:59 is still the same week.
        let sunday = Utc.with_ymd_and_hms(2025, 1, 19, 23, 59, 59).unwrap();
        assert_eq!(stats.user_stats_at(user, &sunday).unwrap().activities_this_week, 1);

        let next_week = Utc.with_ymd_and_hms(2025, 1, 20, 0, 0, 1).unwrap();
        let later = stats.user_stats_at(user, &next_week).unwrap();
        assert_eq!(later.activities_this_week, 0);
        assert_eq!(later.weekly_duration, 0);
        assert_eq!(later.total_activities, 1);
        assert_eq!(later.total_duration, 45);
    }

    #[test]
    fn test_user_stats_include_private_activities() {
        let db = test_support::db();
        let stats = StatsService::new(db.clone());
        let user = test_support::user(&db, "drinker", PrivacyLevel::Private);
        test_support::spot(&db, user, "Porch");
        test_support::activity(&db, user, None, PrivacyLevel::Private, tuesday());

        let result = stats.user_stats_at(user, &tuesday()).unwrap();
        assert_eq!(result.total_activities, 1);
        assert_eq!(result.total_spots, 1);
        assert_eq!(result.favorite_tea_type, "sencha");
    }

    #[test]
    fn test_dashboard_mirrors_viewer_new_spots() {
        let db = test_support::db();
        let stats = StatsService::new(db.clone());
        let viewer = test_support::user(&db, "viewer", PrivacyLevel::Public);
        let other = test_support::user(&db, "other", PrivacyLevel::Public);
        test_support::spot(&db, viewer, "Mine");
        test_support::spot(&db, other, "Theirs");
        test_support::spot(&db, other, "Theirs too");

        let now = Utc::now();
        let dashboard = stats.dashboard_at(viewer, &now).unwrap();
        assert_eq!(dashboard.weekly_stats.new_spots, 1);
        assert_eq!(dashboard.community_stats.new_spots_this_week, 1);
    }

    #[test]
    fn test_dashboard_community_figures_are_global() {
        let db = test_support::db();
        let stats = StatsService::new(db.clone());
        let viewer = test_support::user(&db, "viewer", PrivacyLevel::Public);
        let other = test_support::user(&db, "other", PrivacyLevel::Private);
        let spot = test_support::spot(&db, other, "Hidden Hut");
        let now = Utc::now();

        test_support::activity(&db, other, Some(spot), PrivacyLevel::Private, now);
        test_support::activity(&db, viewer, None, PrivacyLevel::Public, now);

        let dashboard = stats.dashboard_at(viewer, &now).unwrap();
        assert_eq!(dashboard.community_stats.active_users, 2);
        assert_eq!(dashboard.community_stats.sessions_today, 2);
        assert_eq!(dashboard.weekly_stats.activities_count, 1);
        // The private session does not make its spot popular for others.
        assert!(dashboard.popular_spots.is_empty());
    }
}
