// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Statistics payloads and their pure aggregation rules.
//!
//! Aggregates are recomputed on every request from the raw activity rows;
//! nothing here is persisted.

use serde::Serialize;
use std::collections::BTreeMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::activity::ActivityFacts;
use crate::time_utils::CalendarWindows;

/// Per-user rollup.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    // ─── All Time ────────────────────────────────────────────────
    pub total_activities: u32,
    pub total_spots: u32,
    /// Minutes
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_duration: i64,

    // ─── Calendar Windows ────────────────────────────────────────
    pub activities_this_week: u32,
    /// Minutes
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub weekly_duration: i64,
    pub activities_this_month: u32,

    // ─── Preferences ─────────────────────────────────────────────
    /// Most frequent tea type, empty when the user never recorded one
    pub favorite_tea_type: String,
}

impl UserStats {
    /// Aggregate a user's full activity history.
    pub fn from_activities(
        activities: &[ActivityFacts],
        total_spots: u32,
        windows: &CalendarWindows,
    ) -> Self {
        let mut stats = UserStats {
            total_spots,
            ..Default::default()
        };

        for activity in activities {
            let minutes = activity.duration_minutes.unwrap_or(0);

            stats.total_activities += 1;
            stats.total_duration += minutes;

            if activity.created_at >= windows.week_start {
                stats.activities_this_week += 1;
                stats.weekly_duration += minutes;
            }
            if activity.created_at >= windows.month_start {
                stats.activities_this_month += 1;
            }
        }

        stats.favorite_tea_type = favorite_tea_type(activities);
        stats
    }
}

/// Mode of the non-empty tea types.
///
/// Ties go to the alphabetically smallest value so the answer is stable.
pub fn favorite_tea_type(activities: &[ActivityFacts]) -> String {
    let mut counts: BTreeMap<&str, u32> = BTreeMap::new();
    for tea in activities
        .iter()
        .filter_map(|a| a.tea_type.as_deref())
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        *counts.entry(tea).or_insert(0) += 1;
    }

    // BTreeMap iterates in ascending key order; keep the first maximum.
    let mut best: Option<(&str, u32)> = None;
    for (tea, count) in counts {
        match best {
            Some((_, c)) if c >= count => {}
            _ => best = Some((tea, count)),
        }
    }

    best.map(|(tea, _)| tea.to_string()).unwrap_or_default()
}

/// The viewer's own figures for the current week.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyStats {
    pub activities_count: u32,
    /// Minutes
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_duration: i64,
    pub new_spots: u32,
}

impl WeeklyStats {
    pub fn from_activities(
        activities: &[ActivityFacts],
        new_spots: u32,
        windows: &CalendarWindows,
    ) -> Self {
        let this_week = activities
            .iter()
            .filter(|a| a.created_at >= windows.week_start);

        let mut weekly = WeeklyStats {
            new_spots,
            ..Default::default()
        };
        for activity in this_week {
            weekly.activities_count += 1;
            weekly.total_duration += activity.duration_minutes.unwrap_or(0);
        }
        weekly
    }
}

/// Spot ranked by recent activity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct PopularSpot {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: i64,
    pub name: String,
    pub address: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub activity_count: u32,
}

/// Platform-wide figures.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct CommunityStats {
    /// Distinct users with an activity in the last 7 days
    pub active_users: u32,
    /// Activities since local midnight
    pub sessions_today: u32,
    /// Mirrors `WeeklyStats::new_spots` of the viewer
    pub new_spots_this_week: u32,
}

/// Dashboard payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub weekly_stats: WeeklyStats,
    pub popular_spots: Vec<PopularSpot>,
    pub community_stats: CommunityStats,
}
