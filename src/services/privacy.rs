// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Visibility rule for activities and user-owned resources.
//!
//! A resource owned by `owner` at privacy `level` is visible to `viewer` if
//! any of the following holds:
//!
//! 1. `level` is public
//! 2. the viewer is the owner
//! 3. `level` is friends and the viewer follows the owner
//!
//! Following is one-directional: the owner need not follow the viewer back.
//! Nothing grants a third party access to a private resource.
//!
//! The rule exists twice, as [`can_view`] for single rows and as
//! [`visible_sql`] for list queries. Both must stay in agreement.

use crate::db::Db;
use crate::error::AppError;
use crate::models::PrivacyLevel;

/// Decide whether `viewer` (None for anonymous) may see the resource.
pub fn can_view(
    viewer: Option<i64>,
    owner_id: i64,
    level: PrivacyLevel,
    viewer_follows_owner: bool,
) -> bool {
    match (level, viewer) {
        (PrivacyLevel::Public, _) => true,
        (_, None) => false,
        (_, Some(v)) if v == owner_id => true,
        (PrivacyLevel::Friends, Some(_)) => viewer_follows_owner,
        (PrivacyLevel::Private, Some(_)) => false,
    }
}

/// Whether answering [`can_view`] requires knowing the follow relation.
pub fn needs_follow_lookup(viewer: Option<i64>, owner_id: i64, level: PrivacyLevel) -> bool {
    level == PrivacyLevel::Friends && viewer.is_some_and(|v| v != owner_id)
}

/// [`can_view`] with the follow relation looked up only when it matters.
pub fn check_visible(
    db: &Db,
    viewer: Option<i64>,
    owner_id: i64,
    level: PrivacyLevel,
) -> Result<bool, AppError> {
    let follows = match viewer {
        Some(v) if needs_follow_lookup(viewer, owner_id, level) => db.is_following(v, owner_id)?,
        _ => false,
    };
    Ok(can_view(viewer, owner_id, level, follows))
}

/// SQL rendering of [`can_view`].
///
/// The statement must bind `:viewer_id`, which is NULL for anonymous
/// viewers. Comparisons against NULL are never true, so anonymous viewers
/// only match the public branch.
pub fn visible_sql(owner_col: &str, level_col: &str) -> String {
    format!(
        "({level} = 'public' \
         OR {owner} = :viewer_id \
         OR ({level} = 'friends' AND EXISTS (\
             SELECT 1 FROM follows vf \
             WHERE vf.follower_id = :viewer_id AND vf.following_id = {owner})))",
        level = level_col,
        owner = owner_col,
    )
}
