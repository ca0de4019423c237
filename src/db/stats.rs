// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Aggregate queries for the dashboard.

use chrono::{DateTime, Utc};
use rusqlite::{named_params, params};

use super::{count_u32, Db};
use crate::error::AppError;
use crate::models::PopularSpot;
use crate::services::privacy::visible_sql;
use crate::time_utils::format_utc_rfc3339;

impl Db {
    /// Spots ranked by activities since `since`, counting only activities
    /// the viewer is allowed to see. Spots with no such activity are left
    /// out. Ties go to the lower spot id.
    pub fn popular_spots(
        &self,
        viewer: Option<i64>,
        since: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<PopularSpot>, AppError> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT s.id, s.name, s.address, s.latitude, s.longitude, COUNT(a.id) AS n \
             FROM spots s \
             JOIN activities a ON a.spot_id = s.id \
             WHERE a.created_at >= :since AND {visible} \
             GROUP BY s.id \
             ORDER BY n DESC, s.id \
             LIMIT :limit",
            visible = visible_sql("a.user_id", "a.privacy_level"),
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(
            named_params! {
                ":viewer_id": viewer,
                ":since": format_utc_rfc3339(since),
                ":limit": limit,
            },
            |row| {
                Ok(PopularSpot {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    address: row.get(2)?,
                    latitude: row.get(3)?,
                    longitude: row.get(4)?,
                    activity_count: count_u32(row.get(5)?),
                })
            },
        )?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Distinct users with at least one activity since `since`.
    pub fn count_active_users_since(&self, since: DateTime<Utc>) -> Result<u32, AppError> {
        let conn = self.conn()?;
        let total: i64 = conn.query_row(
            "SELECT COUNT(DISTINCT user_id) FROM activities WHERE created_at >= ?1",
            params![format_utc_rfc3339(since)],
            |row| row.get(0),
        )?;
        Ok(count_u32(total))
    }

    /// Activities by anyone, at any privacy level, since `since`.
    pub fn count_activities_since(&self, since: DateTime<Utc>) -> Result<u32, AppError> {
        let conn = self.conn()?;
        let total: i64 = conn.query_row(
            "SELECT COUNT(*) FROM activities WHERE created_at >= ?1",
            params![format_utc_rfc3339(since)],
            |row| row.get(0),
        )?;
        Ok(count_u32(total))
    }
}
