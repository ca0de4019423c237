// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity queries, including the privacy-filtered feed.

use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{named_params, params, OptionalExtension, Row};

use super::{count_u32, Db};
use crate::error::AppError;
use crate::models::{
    ActivityChanges, ActivityFacts, ActivityRecord, NewActivity, SpotSummary, UserSummary,
};
use crate::services::privacy::visible_sql;
use crate::time_utils::{format_utc_rfc3339, parse_utc_rfc3339};

/// Which activities a feed covers, before the visibility rule is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedScope {
    Global,
    Spot(i64),
    User(i64),
}

impl FeedScope {
    fn spot_id(self) -> Option<i64> {
        match self {
            FeedScope::Spot(id) => Some(id),
            _ => None,
        }
    }

    fn user_id(self) -> Option<i64> {
        match self {
            FeedScope::User(id) => Some(id),
            _ => None,
        }
    }
}

const ACTIVITY_SELECT: &str = "\
    SELECT a.id, a.user_id, a.spot_id, a.title, a.description, a.tea_type, \
           a.duration_minutes, a.privacy_level, a.created_at, a.updated_at, \
           u.id, u.username, u.display_name, u.avatar_url, \
           s.id, s.name, s.latitude, s.longitude, s.address, \
           (SELECT COUNT(*) FROM activity_likes l WHERE l.activity_id = a.id), \
           (SELECT COUNT(*) FROM activity_comments c WHERE c.activity_id = a.id) \
    FROM activities a \
    JOIN users u ON u.id = a.user_id \
    LEFT JOIN spots s ON s.id = a.spot_id";

fn row_to_activity(row: &Row<'_>) -> rusqlite::Result<ActivityRecord> {
    let spot = match row.get::<_, Option<i64>>(14)? {
        Some(id) => Some(SpotSummary {
            id,
            name: row.get(15)?,
            latitude: row.get(16)?,
            longitude: row.get(17)?,
            address: row.get(18)?,
        }),
        None => None,
    };

    Ok(ActivityRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        spot_id: row.get(2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        tea_type: row.get(5)?,
        duration_minutes: row.get(6)?,
        privacy_level: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
        owner: UserSummary {
            id: row.get(10)?,
            username: row.get(11)?,
            display_name: row.get(12)?,
            avatar_url: row.get(13)?,
        },
        spot,
        like_count: count_u32(row.get(19)?),
        comment_count: count_u32(row.get(20)?),
    })
}

fn row_to_facts(row: &Row<'_>) -> rusqlite::Result<ActivityFacts> {
    let raw: String = row.get(0)?;
    let created_at = parse_utc_rfc3339(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            Type::Text,
            format!("invalid timestamp '{}'", raw).into(),
        )
    })?;
    Ok(ActivityFacts {
        created_at,
        tea_type: row.get(1)?,
        duration_minutes: row.get(2)?,
    })
}

/// WHERE clause for a feed: the visibility rule on the activity's own
/// level, AND-ed with the scope.
fn feed_where() -> String {
    format!(
        "WHERE {visible} \
           AND (:spot_id IS NULL OR a.spot_id = :spot_id) \
           AND (:user_id IS NULL OR a.user_id = :user_id)",
        visible = visible_sql("a.user_id", "a.privacy_level"),
    )
}

impl Db {
    /// One page of the feed, newest first.
    pub fn list_feed(
        &self,
        viewer: Option<i64>,
        scope: FeedScope,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<ActivityRecord>, AppError> {
        let conn = self.conn()?;
        let sql = format!(
            "{select} {filter} ORDER BY a.created_at DESC, a.id DESC LIMIT :limit OFFSET :offset",
            select = ACTIVITY_SELECT,
            filter = feed_where(),
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(
            named_params! {
                ":viewer_id": viewer,
                ":spot_id": scope.spot_id(),
                ":user_id": scope.user_id(),
                ":limit": limit,
                ":offset": offset,
            },
            row_to_activity,
        )?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Total feed size under the same condition as [`Db::list_feed`].
    pub fn count_feed(&self, viewer: Option<i64>, scope: FeedScope) -> Result<u32, AppError> {
        let conn = self.conn()?;
        let sql = format!("SELECT COUNT(*) FROM activities a {}", feed_where());
        let total: i64 = conn.query_row(
            &sql,
            named_params! {
                ":viewer_id": viewer,
                ":spot_id": scope.spot_id(),
                ":user_id": scope.user_id(),
            },
            |row| row.get(0),
        )?;
        Ok(count_u32(total))
    }

    /// Recent activities at a spot, filtered on each owner's profile level
    /// rather than the activity's own level.
    pub fn list_spot_activities_by_owner_level(
        &self,
        viewer: Option<i64>,
        spot_id: i64,
        limit: u32,
    ) -> Result<Vec<ActivityRecord>, AppError> {
        let conn = self.conn()?;
        let sql = format!(
            "{select} WHERE a.spot_id = :spot_id AND {visible} \
             ORDER BY a.created_at DESC, a.id DESC LIMIT :limit",
            select = ACTIVITY_SELECT,
            visible = visible_sql("a.user_id", "u.privacy_level"),
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(
            named_params! {
                ":viewer_id": viewer,
                ":spot_id": spot_id,
                ":limit": limit,
            },
            row_to_activity,
        )?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn get_activity_record(&self, id: i64) -> Result<Option<ActivityRecord>, AppError> {
        let conn = self.conn()?;
        let record = conn
            .query_row(
                &format!("{} WHERE a.id = ?1", ACTIVITY_SELECT),
                [id],
                row_to_activity,
            )
            .optional()?;
        Ok(record)
    }

    pub fn create_activity(&self, activity: &NewActivity) -> Result<i64, AppError> {
        let conn = self.conn()?;
        let created_at = format_utc_rfc3339(activity.created_at);
        conn.execute(
            "INSERT INTO activities (user_id, spot_id, title, description, tea_type, \
                                     duration_minutes, privacy_level, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
            params![
                activity.user_id,
                activity.spot_id,
                activity.title,
                activity.description,
                activity.tea_type,
                activity.duration_minutes,
                activity.privacy_level,
                created_at,
            ],
        )?;
        let id = conn.last_insert_rowid();
        tracing::info!(
            activity_id = id,
            user_id = activity.user_id,
            spot_id = ?activity.spot_id,
            "Created activity"
        );
        Ok(id)
    }

    /// Apply a partial update. Returns false when the activity is gone.
    pub fn update_activity(&self, id: i64, changes: &ActivityChanges) -> Result<bool, AppError> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE activities SET \
                 spot_id = CASE WHEN ?9 THEN ?2 ELSE spot_id END, \
                 title = COALESCE(?3, title), \
                 description = COALESCE(?4, description), \
                 tea_type = COALESCE(?5, tea_type), \
                 duration_minutes = CASE WHEN ?10 THEN ?6 ELSE duration_minutes END, \
                 privacy_level = COALESCE(?7, privacy_level), \
                 updated_at = ?8 \
             WHERE id = ?1",
            params![
                id,
                changes.spot_id.flatten(),
                changes.title,
                changes.description,
                changes.tea_type,
                changes.duration_minutes.flatten(),
                changes.privacy_level,
                format_utc_rfc3339(Utc::now()),
                changes.spot_id.is_some(),
                changes.duration_minutes.is_some(),
            ],
        )?;
        Ok(updated > 0)
    }

    /// Delete an activity with its likes, comments and media.
    pub fn delete_activity(&self, id: i64) -> Result<bool, AppError> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM activities WHERE id = ?1", [id])?;
        if deleted > 0 {
            tracing::info!(activity_id = id, "Deleted activity");
        }
        Ok(deleted > 0)
    }

    /// Every activity of a user, unfiltered, for statistics.
    pub fn activity_facts_for_user(&self, user_id: i64) -> Result<Vec<ActivityFacts>, AppError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT created_at, tea_type, duration_minutes FROM activities \
             WHERE user_id = ?1 ORDER BY created_at",
        )?;
        let rows = stmt.query_map([user_id], row_to_facts)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}
