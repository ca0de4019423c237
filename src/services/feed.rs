// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity feed assembly and the activity/comment/like workflows.
//!
//! Every read goes through the visibility rule in [`crate::services::privacy`]:
//! list queries filter in SQL, single-row reads check in memory. A page is
//! assembled with a fixed number of queries regardless of its size:
//!
//! 1. the page of activity rows (owner, spot and counts joined in)
//! 2. the total under the same condition
//! 3. media for the page
//! 4. comment previews for the page
//! 5. the viewer's likes for the page (skipped for anonymous viewers)

use chrono::Utc;
use std::collections::HashSet;

use crate::db::{Db, FeedScope};
use crate::error::{AppError, Result};
use crate::models::{
    ActivityChanges, ActivityDetail, ActivityRecord, ActivityView, CommentRequest, CommentView,
    CreateActivityRequest, LikeToggle, MediaOwner, NewActivity, Page, PageRequest,
    UpdateActivityRequest,
};
use crate::services::privacy::check_visible;

/// Comments embedded in each feed item.
pub const COMMENT_PREVIEW_COUNT: u32 = 2;

/// Assembles feeds and applies activity mutations.
#[derive(Clone)]
pub struct FeedService {
    db: Db,
}

impl FeedService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    // ─── Reads ───────────────────────────────────────────────────

    /// One page of the feed for `scope`, newest first.
    pub fn list_activities(
        &self,
        viewer: Option<i64>,
        scope: FeedScope,
        page: PageRequest,
    ) -> Result<Page<ActivityView>> {
        let records = self
            .db
            .list_feed(viewer, scope, page.limit, page.offset())?;
        let total = self.db.count_feed(viewer, scope)?;

        tracing::debug!(
            viewer = ?viewer,
            scope = ?scope,
            page = page.page,
            returned = records.len(),
            total,
            "Assembled feed page"
        );

        Ok(Page::new(self.assemble(viewer, records)?, page, total))
    }

    /// Feed of one user's activities, looked up by username.
    pub fn list_user_activities(
        &self,
        viewer: Option<i64>,
        username: &str,
        page: PageRequest,
    ) -> Result<Page<ActivityView>> {
        let user = self
            .db
            .get_user_by_username(username)?
            .ok_or_else(|| AppError::NotFound(format!("User '{}' not found", username)))?;
        self.list_activities(viewer, FeedScope::User(user.id), page)
    }

    /// Feed of activities logged at one spot.
    pub fn list_spot_activities(
        &self,
        viewer: Option<i64>,
        spot_id: i64,
        page: PageRequest,
    ) -> Result<Page<ActivityView>> {
        if !self.db.spot_exists(spot_id)? {
            return Err(AppError::NotFound(format!("Spot {} not found", spot_id)));
        }
        self.list_activities(viewer, FeedScope::Spot(spot_id), page)
    }

    /// Attach media, comment previews and like state to a page of rows.
    pub fn assemble(
        &self,
        viewer: Option<i64>,
        records: Vec<ActivityRecord>,
    ) -> Result<Vec<ActivityView>> {
        let ids: Vec<i64> = records.iter().map(|r| r.id).collect();

        let mut media = self.db.media_for_activities(&ids)?;
        let mut previews = self.db.comment_previews(&ids, COMMENT_PREVIEW_COUNT)?;
        let liked: HashSet<i64> = match viewer {
            Some(viewer_id) => self.db.liked_by(viewer_id, &ids)?,
            None => HashSet::new(),
        };

        Ok(records
            .into_iter()
            .map(|record| {
                let id = record.id;
                ActivityView::from_record(
                    record,
                    media.remove(&id).unwrap_or_default(),
                    previews.remove(&id).unwrap_or_default(),
                    liked.contains(&id),
                )
            })
            .collect())
    }

    /// Load an activity the viewer is allowed to see.
    ///
    /// Missing and hidden are distinct: 404 versus 403.
    fn visible_record(&self, viewer: Option<i64>, id: i64) -> Result<ActivityRecord> {
        let record = self
            .db
            .get_activity_record(id)?
            .ok_or_else(|| AppError::NotFound(format!("Activity {} not found", id)))?;

        if !check_visible(&self.db, viewer, record.user_id, record.privacy_level)? {
            tracing::debug!(activity_id = id, viewer = ?viewer, "Activity hidden from viewer");
            return Err(AppError::Forbidden(
                "You do not have access to this activity".to_string(),
            ));
        }
        Ok(record)
    }

    /// Load an activity owned by `user_id`.
    fn owned_record(&self, user_id: i64, id: i64) -> Result<ActivityRecord> {
        let record = self
            .db
            .get_activity_record(id)?
            .ok_or_else(|| AppError::NotFound(format!("Activity {} not found", id)))?;

        if record.user_id != user_id {
            tracing::warn!(activity_id = id, user_id, "Rejected change by non-owner");
            return Err(AppError::Forbidden(
                "Only the owner can change this activity".to_string(),
            ));
        }
        Ok(record)
    }

    /// Single activity with every comment (oldest first) and every like.
    pub fn get_activity(&self, viewer: Option<i64>, id: i64) -> Result<ActivityDetail> {
        let record = self.visible_record(viewer, id)?;

        let media = self.db.list_media(MediaOwner::Activity(id))?;
        let comments = self.db.list_comments(id, None, 0)?;
        let likes = self.db.list_likes(id)?;
        let is_liked = viewer.is_some_and(|v| likes.iter().any(|like| like.user.id == v));

        Ok(ActivityDetail {
            activity: ActivityView::from_record(record, media, comments, is_liked),
            likes,
        })
    }

    // ─── Mutations ───────────────────────────────────────────────

    /// Create an activity for `user_id`.
    ///
    /// The activity row and its photos are written as separate statements.
    /// If the photo insert fails the activity remains without photos and
    /// the error is returned to the caller.
    pub fn create_activity(
        &self,
        user_id: i64,
        request: CreateActivityRequest,
    ) -> Result<ActivityDetail> {
        let title = non_blank(&request.title, "title")?;

        if let Some(spot_id) = request.spot_id {
            if !self.db.spot_exists(spot_id)? {
                return Err(AppError::NotFound(format!("Spot {} not found", spot_id)));
            }
        }

        let id = self.db.create_activity(&NewActivity {
            user_id,
            spot_id: request.spot_id,
            title,
            description: request.description,
            tea_type: request.tea_type.map(|t| t.trim().to_string()),
            duration_minutes: request.duration_minutes,
            privacy_level: request.privacy_level,
            created_at: Utc::now(),
        })?;

        if let Some(photos) = request.photos.as_deref() {
            self.db.add_media(MediaOwner::Activity(id), photos)?;
        }

        self.get_activity(Some(user_id), id)
    }

    /// Owner-only partial update.
    pub fn update_activity(
        &self,
        user_id: i64,
        id: i64,
        request: UpdateActivityRequest,
    ) -> Result<ActivityDetail> {
        self.owned_record(user_id, id)?;

        let title = request
            .title
            .as_deref()
            .map(|t| non_blank(t, "title"))
            .transpose()?;

        if let Some(Some(spot_id)) = request.spot_id {
            if !self.db.spot_exists(spot_id)? {
                return Err(AppError::NotFound(format!("Spot {} not found", spot_id)));
            }
        }

        let changes = ActivityChanges {
            spot_id: request.spot_id,
            title,
            description: request.description,
            tea_type: request.tea_type.map(|t| t.trim().to_string()),
            duration_minutes: request.duration_minutes,
            privacy_level: request.privacy_level,
        };
        if !self.db.update_activity(id, &changes)? {
            return Err(AppError::NotFound(format!("Activity {} not found", id)));
        }

        if let Some(photos) = request.photos.as_deref() {
            self.db.replace_media(MediaOwner::Activity(id), photos)?;
        }

        tracing::info!(activity_id = id, user_id, "Updated activity");
        self.get_activity(Some(user_id), id)
    }

    /// Owner-only delete; likes, comments and media cascade.
    pub fn delete_activity(&self, user_id: i64, id: i64) -> Result<()> {
        self.owned_record(user_id, id)?;
        if !self.db.delete_activity(id)? {
            return Err(AppError::NotFound(format!("Activity {} not found", id)));
        }
        Ok(())
    }

    /// Flip the viewer's like. The viewer must be able to see the activity.
    pub fn toggle_like(&self, user_id: i64, id: i64) -> Result<LikeToggle> {
        self.visible_record(Some(user_id), id)?;
        self.db.toggle_like(id, user_id)
    }

    // ─── Comments ────────────────────────────────────────────────

    /// Comments on a visible activity, oldest first.
    pub fn list_comments(
        &self,
        viewer: Option<i64>,
        activity_id: i64,
        page: PageRequest,
    ) -> Result<Page<CommentView>> {
        self.visible_record(viewer, activity_id)?;
        let comments = self
            .db
            .list_comments(activity_id, Some(page.limit), page.offset())?;
        let total = self.db.count_comments(activity_id)?;
        Ok(Page::new(comments, page, total))
    }

    pub fn add_comment(
        &self,
        user_id: i64,
        activity_id: i64,
        request: CommentRequest,
    ) -> Result<CommentView> {
        self.visible_record(Some(user_id), activity_id)?;
        let content = non_blank(&request.content, "content")?;
        let comment = self.db.create_comment(activity_id, user_id, &content)?;
        tracing::debug!(activity_id, comment_id = comment.id, user_id, "Added comment");
        Ok(comment)
    }

    /// Load a comment that belongs to `activity_id` and was written by
    /// `user_id`.
    fn authored_comment(&self, user_id: i64, activity_id: i64, comment_id: i64) -> Result<CommentView> {
        let comment = self
            .db
            .get_comment(comment_id)?
            .filter(|c| c.activity_id == activity_id)
            .ok_or_else(|| AppError::NotFound(format!("Comment {} not found", comment_id)))?;

        if comment.user.id != user_id {
            return Err(AppError::Forbidden(
                "Only the author can change this comment".to_string(),
            ));
        }
        Ok(comment)
    }

    pub fn update_comment(
        &self,
        user_id: i64,
        activity_id: i64,
        comment_id: i64,
        request: CommentRequest,
    ) -> Result<CommentView> {
        self.authored_comment(user_id, activity_id, comment_id)?;
        let content = non_blank(&request.content, "content")?;
        self.db.update_comment(comment_id, &content)
    }

    pub fn delete_comment(&self, user_id: i64, activity_id: i64, comment_id: i64) -> Result<()> {
        self.authored_comment(user_id, activity_id, comment_id)?;
        if !self.db.delete_comment(comment_id)? {
            return Err(AppError::NotFound(format!("Comment {} not found", comment_id)));
        }
        Ok(())
    }
}

/// Trim `value` and reject it when nothing is left.
fn non_blank(value: &str, field: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(format!("{} must not be blank", field)));
    }
    Ok(trimmed.to_string())
}
