// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Likes, comments and follow edges.

use chrono::Utc;
use rusqlite::{params, params_from_iter, OptionalExtension, Row};
use std::collections::{HashMap, HashSet};

use super::{count_u32, placeholders, Db};
use crate::error::AppError;
use crate::models::{CommentView, LikeToggle, LikeView, UserSummary};
use crate::time_utils::format_utc_rfc3339;

const COMMENT_SELECT: &str = "\
    SELECT c.id, c.activity_id, c.content, c.created_at, c.updated_at, \
           u.id, u.username, u.display_name, u.avatar_url \
    FROM activity_comments c \
    JOIN users u ON u.id = c.user_id";

fn row_to_comment(row: &Row<'_>) -> rusqlite::Result<CommentView> {
    Ok(CommentView {
        id: row.get(0)?,
        activity_id: row.get(1)?,
        content: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
        user: UserSummary {
            id: row.get(5)?,
            username: row.get(6)?,
            display_name: row.get(7)?,
            avatar_url: row.get(8)?,
        },
    })
}

fn row_to_summary(row: &Row<'_>) -> rusqlite::Result<UserSummary> {
    Ok(UserSummary {
        id: row.get(0)?,
        username: row.get(1)?,
        display_name: row.get(2)?,
        avatar_url: row.get(3)?,
    })
}

// ─── Likes ───────────────────────────────────────────────────

impl Db {
    /// Flip the like of `user_id` on `activity_id`.
    ///
    /// The read and the write happen under one connection lock. A unique
    /// violation from a racing writer on another connection surfaces as
    /// a conflict.
    pub fn toggle_like(&self, activity_id: i64, user_id: i64) -> Result<LikeToggle, AppError> {
        let conn = self.conn()?;

        let removed = conn.execute(
            "DELETE FROM activity_likes WHERE activity_id = ?1 AND user_id = ?2",
            params![activity_id, user_id],
        )?;
        let liked = if removed == 0 {
            conn.execute(
                "INSERT INTO activity_likes (activity_id, user_id, created_at) \
                 VALUES (?1, ?2, ?3)",
                params![activity_id, user_id, format_utc_rfc3339(Utc::now())],
            )?;
            true
        } else {
            false
        };

        let like_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM activity_likes WHERE activity_id = ?1",
            [activity_id],
            |row| row.get(0),
        )?;

        tracing::debug!(activity_id, user_id, liked, "Toggled like");

        Ok(LikeToggle {
            liked,
            like_count: count_u32(like_count),
        })
    }

    /// Every like on an activity, oldest first.
    pub fn list_likes(&self, activity_id: i64) -> Result<Vec<LikeView>, AppError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT u.id, u.username, u.display_name, u.avatar_url, l.created_at \
             FROM activity_likes l \
             JOIN users u ON u.id = l.user_id \
             WHERE l.activity_id = ?1 \
             ORDER BY l.created_at, u.id",
        )?;
        let rows = stmt.query_map([activity_id], |row| {
            Ok(LikeView {
                user: row_to_summary(row)?,
                created_at: row.get(4)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Which of `activity_ids` the viewer has liked, in one query.
    pub fn liked_by(&self, user_id: i64, activity_ids: &[i64]) -> Result<HashSet<i64>, AppError> {
        if activity_ids.is_empty() {
            return Ok(HashSet::new());
        }
        let conn = self.conn()?;
        let sql = format!(
            "SELECT activity_id FROM activity_likes WHERE user_id = ? AND activity_id IN ({})",
            placeholders(activity_ids.len())
        );
        let mut stmt = conn.prepare(&sql)?;
        let args = std::iter::once(user_id).chain(activity_ids.iter().copied());
        let rows = stmt.query_map(params_from_iter(args), |row| row.get(0))?;
        Ok(rows.collect::<rusqlite::Result<HashSet<i64>>>()?)
    }
}

// ─── Comments ────────────────────────────────────────────────

impl Db {
    /// The `per_activity` most recent comments of each activity, newest
    /// first, in one query.
    pub fn comment_previews(
        &self,
        activity_ids: &[i64],
        per_activity: u32,
    ) -> Result<HashMap<i64, Vec<CommentView>>, AppError> {
        let mut grouped: HashMap<i64, Vec<CommentView>> = HashMap::new();
        if activity_ids.is_empty() || per_activity == 0 {
            return Ok(grouped);
        }

        let conn = self.conn()?;
        let sql = format!(
            "SELECT id, activity_id, content, created_at, updated_at, \
                    user_id, username, display_name, avatar_url \
             FROM ( \
                 SELECT c.id, c.activity_id, c.content, c.created_at, c.updated_at, \
                        u.id AS user_id, u.username, u.display_name, u.avatar_url, \
                        ROW_NUMBER() OVER ( \
                            PARTITION BY c.activity_id \
                            ORDER BY c.created_at DESC, c.id DESC \
                        ) AS rn \
                 FROM activity_comments c \
                 JOIN users u ON u.id = c.user_id \
                 WHERE c.activity_id IN ({}) \
             ) \
             WHERE rn <= ? \
             ORDER BY activity_id, rn",
            placeholders(activity_ids.len())
        );
        let mut stmt = conn.prepare(&sql)?;
        let args = activity_ids
            .iter()
            .copied()
            .chain(std::iter::once(i64::from(per_activity)));
        let rows = stmt.query_map(params_from_iter(args), row_to_comment)?;

        for comment in rows {
            let comment = comment?;
            grouped.entry(comment.activity_id).or_default().push(comment);
        }
        Ok(grouped)
    }

    /// Comments on an activity, oldest first. `limit = None` returns all.
    pub fn list_comments(
        &self,
        activity_id: i64,
        limit: Option<u32>,
        offset: u32,
    ) -> Result<Vec<CommentView>, AppError> {
        let conn = self.conn()?;
        let sql = format!(
            "{} WHERE c.activity_id = ?1 ORDER BY c.created_at, c.id LIMIT ?2 OFFSET ?3",
            COMMENT_SELECT
        );
        let mut stmt = conn.prepare(&sql)?;
        let limit = limit.map(i64::from).unwrap_or(-1);
        let rows = stmt.query_map(params![activity_id, limit, offset], row_to_comment)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn count_comments(&self, activity_id: i64) -> Result<u32, AppError> {
        let conn = self.conn()?;
        let total: i64 = conn.query_row(
            "SELECT COUNT(*) FROM activity_comments WHERE activity_id = ?1",
            [activity_id],
            |row| row.get(0),
        )?;
        Ok(count_u32(total))
    }

    pub fn get_comment(&self, id: i64) -> Result<Option<CommentView>, AppError> {
        let conn = self.conn()?;
        let comment = conn
            .query_row(
                &format!("{} WHERE c.id = ?1", COMMENT_SELECT),
                [id],
                row_to_comment,
            )
            .optional()?;
        Ok(comment)
    }

    pub fn create_comment(
        &self,
        activity_id: i64,
        user_id: i64,
        content: &str,
    ) -> Result<CommentView, AppError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO activity_comments (activity_id, user_id, content, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![activity_id, user_id, content, format_utc_rfc3339(Utc::now())],
        )?;
        let id = conn.last_insert_rowid();
        conn.query_row(
            &format!("{} WHERE c.id = ?1", COMMENT_SELECT),
            [id],
            row_to_comment,
        )
        .map_err(AppError::from)
    }

    pub fn update_comment(&self, id: i64, content: &str) -> Result<CommentView, AppError> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE activity_comments SET content = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, content, format_utc_rfc3339(Utc::now())],
        )?;
        if updated == 0 {
            return Err(AppError::NotFound(format!("Comment {} not found", id)));
        }
        conn.query_row(
            &format!("{} WHERE c.id = ?1", COMMENT_SELECT),
            [id],
            row_to_comment,
        )
        .map_err(AppError::from)
    }

    pub fn delete_comment(&self, id: i64) -> Result<bool, AppError> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM activity_comments WHERE id = ?1", [id])?;
        Ok(deleted > 0)
    }
}

// ─── Follows ─────────────────────────────────────────────────

impl Db {
    /// Record that `follower_id` follows `following_id`.
    ///
    /// Following twice is a conflict.
    pub fn follow(&self, follower_id: i64, following_id: i64) -> Result<(), AppError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO follows (follower_id, following_id, created_at) VALUES (?1, ?2, ?3)",
            params![follower_id, following_id, format_utc_rfc3339(Utc::now())],
        )?;
        tracing::debug!(follower_id, following_id, "Follow created");
        Ok(())
    }

    /// Remove a follow edge. Returns false when there was none.
    pub fn unfollow(&self, follower_id: i64, following_id: i64) -> Result<bool, AppError> {
        let conn = self.conn()?;
        let removed = conn.execute(
            "DELETE FROM follows WHERE follower_id = ?1 AND following_id = ?2",
            params![follower_id, following_id],
        )?;
        Ok(removed > 0)
    }

    pub fn is_following(&self, follower_id: i64, following_id: i64) -> Result<bool, AppError> {
        let conn = self.conn()?;
        let found = conn
            .prepare_cached("SELECT 1 FROM follows WHERE follower_id = ?1 AND following_id = ?2")?
            .exists(params![follower_id, following_id])?;
        Ok(found)
    }

    pub fn count_followers(&self, user_id: i64) -> Result<u32, AppError> {
        let conn = self.conn()?;
        let total: i64 = conn.query_row(
            "SELECT COUNT(*) FROM follows WHERE following_id = ?1",
            [user_id],
            |row| row.get(0),
        )?;
        Ok(count_u32(total))
    }

    pub fn count_following(&self, user_id: i64) -> Result<u32, AppError> {
        let conn = self.conn()?;
        let total: i64 = conn.query_row(
            "SELECT COUNT(*) FROM follows WHERE follower_id = ?1",
            [user_id],
            |row| row.get(0),
        )?;
        Ok(count_u32(total))
    }

    /// Users following `user_id`, most recent first.
    pub fn list_followers(
        &self,
        user_id: i64,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<UserSummary>, AppError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT u.id, u.username, u.display_name, u.avatar_url \
             FROM follows f JOIN users u ON u.id = f.follower_id \
             WHERE f.following_id = ?1 \
             ORDER BY f.created_at DESC, u.id DESC LIMIT ?2 OFFSET ?3",
        )?;
        let rows = stmt.query_map(params![user_id, limit, offset], row_to_summary)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Users `user_id` follows, most recent first.
    pub fn list_following(
        &self,
        user_id: i64,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<UserSummary>, AppError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT u.id, u.username, u.display_name, u.avatar_url \
             FROM follows f JOIN users u ON u.id = f.following_id \
             WHERE f.follower_id = ?1 \
             ORDER BY f.created_at DESC, u.id DESC LIMIT ?2 OFFSET ?3",
        )?;
        let rows = stmt.query_map(params![user_id, limit, offset], row_to_summary)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}
