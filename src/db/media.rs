// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Media attachment queries.

use chrono::Utc;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::collections::HashMap;

use super::{placeholders, Db};
use crate::error::AppError;
use crate::models::{Media, MediaInput, MediaOwner};
use crate::time_utils::format_utc_rfc3339;

const MEDIA_COLUMNS: &str = "id, activity_id, spot_id, file_path, file_type, created_at";

fn row_to_media(row: &Row<'_>) -> rusqlite::Result<Media> {
    Ok(Media {
        id: row.get(0)?,
        activity_id: row.get(1)?,
        spot_id: row.get(2)?,
        file_path: row.get(3)?,
        file_type: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn owner_columns(owner: MediaOwner) -> (Option<i64>, Option<i64>) {
    match owner {
        MediaOwner::Activity(id) => (Some(id), None),
        MediaOwner::Spot(id) => (None, Some(id)),
    }
}

/// Insert media rows on an existing connection or transaction.
pub(super) fn insert_media_on(
    conn: &Connection,
    owner: MediaOwner,
    items: &[MediaInput],
) -> rusqlite::Result<()> {
    let (activity_id, spot_id) = owner_columns(owner);
    let now = format_utc_rfc3339(Utc::now());
    let mut stmt = conn.prepare(
        "INSERT INTO media (activity_id, spot_id, file_path, file_type, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for item in items {
        stmt.execute(params![
            activity_id,
            spot_id,
            item.file_path,
            item.file_type,
            now
        ])?;
    }
    Ok(())
}

/// Delete every media row of `owner`, then insert `items`.
pub(super) fn replace_media_on(
    conn: &Connection,
    owner: MediaOwner,
    items: &[MediaInput],
) -> rusqlite::Result<()> {
    match owner {
        MediaOwner::Activity(id) => conn.execute("DELETE FROM media WHERE activity_id = ?1", [id])?,
        MediaOwner::Spot(id) => conn.execute("DELETE FROM media WHERE spot_id = ?1", [id])?,
    };
    insert_media_on(conn, owner, items)
}

/// Media for a set of parents, keyed by parent id, oldest first.
fn media_by_parent(
    conn: &Connection,
    parent_col: &str,
    parent_of: fn(&Media) -> Option<i64>,
    ids: &[i64],
) -> Result<HashMap<i64, Vec<Media>>, AppError> {
    let mut grouped: HashMap<i64, Vec<Media>> = HashMap::new();
    if ids.is_empty() {
        return Ok(grouped);
    }

    let sql = format!(
        "SELECT {cols} FROM media WHERE {parent} IN ({ph}) ORDER BY id",
        cols = MEDIA_COLUMNS,
        parent = parent_col,
        ph = placeholders(ids.len())
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(ids.iter()), row_to_media)?;

    for media in rows {
        let media = media?;
        if let Some(parent) = parent_of(&media) {
            grouped.entry(parent).or_default().push(media);
        }
    }
    Ok(grouped)
}

impl Db {
    /// Attach media to an activity or spot.
    ///
    /// Runs as independent statements: callers that need the insert to be
    /// atomic with another write must use a transaction instead.
    pub fn add_media(&self, owner: MediaOwner, items: &[MediaInput]) -> Result<(), AppError> {
        if items.is_empty() {
            return Ok(());
        }
        let conn = self.conn()?;
        insert_media_on(&conn, owner, items)?;
        Ok(())
    }

    /// Replace all media of `owner` with `items` (delete-all-then-insert).
    pub fn replace_media(&self, owner: MediaOwner, items: &[MediaInput]) -> Result<(), AppError> {
        let conn = self.conn()?;
        replace_media_on(&conn, owner, items)?;
        Ok(())
    }

    pub fn list_media(&self, owner: MediaOwner) -> Result<Vec<Media>, AppError> {
        let mut grouped = match owner {
            MediaOwner::Activity(id) => self.media_for_activities(&[id])?,
            MediaOwner::Spot(id) => self.media_for_spots(&[id])?,
        };
        let (MediaOwner::Activity(id) | MediaOwner::Spot(id)) = owner;
        Ok(grouped.remove(&id).unwrap_or_default())
    }

    /// Media for a page of activities in one query.
    pub fn media_for_activities(&self, ids: &[i64]) -> Result<HashMap<i64, Vec<Media>>, AppError> {
        let conn = self.conn()?;
        media_by_parent(&conn, "activity_id", |m| m.activity_id, ids)
    }

    /// Media for a page of spots in one query.
    pub fn media_for_spots(&self, ids: &[i64]) -> Result<HashMap<i64, Vec<Media>>, AppError> {
        let conn = self.conn()?;
        media_by_parent(&conn, "spot_id", |m| m.spot_id, ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support;
    use crate::models::PrivacyLevel;

    fn photo(name: &str) -> MediaInput {
        MediaInput {
            file_path: format!("https://cdn.example.com/{}.jpg", name),
            file_type: "image/jpeg".to_string(),
        }
    }

    #[test]
    fn test_replace_media_discards_previous_rows() {
        let db = test_support::db();
        let user = test_support::user(&db, "owner", PrivacyLevel::Public);
        let spot = test_support::spot(&db, user, "Garden");

        db.add_media(MediaOwner::Spot(spot), &[photo("a"), photo("b")])
            .unwrap();
        db.replace_media(MediaOwner::Spot(spot), &[photo("c")])
            .unwrap();

        let media = db.list_media(MediaOwner::Spot(spot)).unwrap();
        assert_eq!(media.len(), 1);
        assert!(media[0].file_path.ends_with("c.jpg"));
    }

    #[test]
    fn test_media_for_activities_groups_by_parent() {
        let db = test_support::db();
        let user = test_support::user(&db, "owner", PrivacyLevel::Public);
        let now = Utc::now();
        let first = test_support::activity(&db, user, None, PrivacyLevel::Public, now);
        let second = test_support::activity(&db, user, None, PrivacyLevel::Public, now);
        let empty = test_support::activity(&db, user, None, PrivacyLevel::Public, now);

        db.add_media(MediaOwner::Activity(first), &[photo("1"), photo("2")])
            .unwrap();
        db.add_media(MediaOwner::Activity(second), &[photo("3")])
            .unwrap();

        let grouped = db.media_for_activities(&[first, second, empty]).unwrap();
        assert_eq!(grouped[&first].len(), 2);
        assert_eq!(grouped[&second].len(), 1);
        assert!(!grouped.contains_key(&empty));
    }
}
