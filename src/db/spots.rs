// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Spot queries.
//!
//! Spots have no privacy level of their own; listings filter on the
//! creator's profile level through the same visibility rule as activities.

use chrono::{DateTime, Utc};
use rusqlite::{named_params, params, OptionalExtension, Row};

use super::media::replace_media_on;
use super::{count_u32, Db};
use crate::error::AppError;
use crate::models::{MediaInput, MediaOwner, NewSpot, SpotChanges, SpotRecord, UserSummary};
use crate::services::privacy::visible_sql;
use crate::time_utils::format_utc_rfc3339;

const SPOT_SELECT: &str = "\
    SELECT s.id, s.creator_id, s.name, s.description, s.latitude, s.longitude, s.address, \
           s.created_at, s.updated_at, \
           u.id, u.username, u.display_name, u.avatar_url, u.privacy_level, \
           (SELECT COUNT(*) FROM activities a WHERE a.spot_id = s.id) \
    FROM spots s \
    JOIN users u ON u.id = s.creator_id";

fn row_to_spot(row: &Row<'_>) -> rusqlite::Result<SpotRecord> {
    Ok(SpotRecord {
        id: row.get(0)?,
        creator_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        latitude: row.get(4)?,
        longitude: row.get(5)?,
        address: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
        creator: UserSummary {
            id: row.get(9)?,
            username: row.get(10)?,
            display_name: row.get(11)?,
            avatar_url: row.get(12)?,
        },
        creator_privacy: row.get(13)?,
        activity_count: count_u32(row.get(14)?),
    })
}

/// Rectangle used to prefilter nearby searches before exact distances.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

/// Filters for spot listings.
#[derive(Debug, Clone, Default)]
pub struct SpotFilter {
    /// Substring of name or address
    pub search: Option<String>,
    pub bounds: Option<BoundingBox>,
}

impl SpotFilter {
    fn like_pattern(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                let escaped = s
                    .replace('\\', "\\\\")
                    .replace('%', "\\%")
                    .replace('_', "\\_");
                format!("%{}%", escaped)
            })
    }
}

/// WHERE clause shared by the visible-spot list and count.
fn visible_spots_where() -> String {
    format!(
        "WHERE {visible} \
           AND (:search IS NULL \
                OR s.name LIKE :search ESCAPE '\\' \
                OR s.address LIKE :search ESCAPE '\\') \
           AND (:min_lat IS NULL OR s.latitude BETWEEN :min_lat AND :max_lat) \
           AND (:min_lng IS NULL OR s.longitude BETWEEN :min_lng AND :max_lng)",
        visible = visible_sql("s.creator_id", "u.privacy_level"),
    )
}

impl Db {
    pub fn create_spot(&self, spot: &NewSpot) -> Result<i64, AppError> {
        let conn = self.conn()?;
        let now = format_utc_rfc3339(Utc::now());
        conn.execute(
            "INSERT INTO spots (creator_id, name, description, latitude, longitude, address, \
                                created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            params![
                spot.creator_id,
                spot.name,
                spot.description,
                spot.latitude,
                spot.longitude,
                spot.address,
                now,
            ],
        )?;
        let id = conn.last_insert_rowid();
        tracing::info!(spot_id = id, creator_id = spot.creator_id, "Created spot");
        Ok(id)
    }

    pub fn get_spot(&self, id: i64) -> Result<Option<SpotRecord>, AppError> {
        let conn = self.conn()?;
        let spot = conn
            .query_row(
                &format!("{} WHERE s.id = ?1", SPOT_SELECT),
                [id],
                row_to_spot,
            )
            .optional()?;
        Ok(spot)
    }

    pub fn spot_exists(&self, id: i64) -> Result<bool, AppError> {
        let conn = self.conn()?;
        let found = conn
            .prepare_cached("SELECT 1 FROM spots WHERE id = ?1")?
            .exists([id])?;
        Ok(found)
    }

    /// Spots whose creator is visible to `viewer`, newest first.
    ///
    /// `limit = None` returns every match (nearby searches rank in memory).
    pub fn list_visible_spots(
        &self,
        viewer: Option<i64>,
        filter: &SpotFilter,
        limit: Option<u32>,
        offset: u32,
    ) -> Result<Vec<SpotRecord>, AppError> {
        let conn = self.conn()?;
        let sql = format!(
            "{select} {filter} ORDER BY s.created_at DESC, s.id DESC LIMIT :limit OFFSET :offset",
            select = SPOT_SELECT,
            filter = visible_spots_where(),
        );
        let bounds = filter.bounds;
        let limit = limit.map(i64::from).unwrap_or(-1);

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(
            named_params! {
                ":viewer_id": viewer,
                ":search": filter.like_pattern(),
                ":min_lat": bounds.map(|b| b.min_lat),
                ":max_lat": bounds.map(|b| b.max_lat),
                ":min_lng": bounds.map(|b| b.min_lng),
                ":max_lng": bounds.map(|b| b.max_lng),
                ":limit": limit,
                ":offset": offset,
            },
            row_to_spot,
        )?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn count_visible_spots(
        &self,
        viewer: Option<i64>,
        filter: &SpotFilter,
    ) -> Result<u32, AppError> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT COUNT(*) FROM spots s JOIN users u ON u.id = s.creator_id {}",
            visible_spots_where()
        );
        let bounds = filter.bounds;
        let total: i64 = conn.query_row(
            &sql,
            named_params! {
                ":viewer_id": viewer,
                ":search": filter.like_pattern(),
                ":min_lat": bounds.map(|b| b.min_lat),
                ":max_lat": bounds.map(|b| b.max_lat),
                ":min_lng": bounds.map(|b| b.min_lng),
                ":max_lng": bounds.map(|b| b.max_lng),
            },
            |row| row.get(0),
        )?;
        Ok(count_u32(total))
    }

    /// Spots created by one user, newest first. Visibility is checked by
    /// the caller against the creator's profile.
    pub fn list_spots_by_creator(
        &self,
        creator_id: i64,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<SpotRecord>, AppError> {
        let conn = self.conn()?;
        let sql = format!(
            "{} WHERE s.creator_id = ?1 ORDER BY s.created_at DESC, s.id DESC LIMIT ?2 OFFSET ?3",
            SPOT_SELECT
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![creator_id, limit, offset], row_to_spot)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn count_spots_by_creator(&self, creator_id: i64) -> Result<u32, AppError> {
        let conn = self.conn()?;
        let total: i64 = conn.query_row(
            "SELECT COUNT(*) FROM spots WHERE creator_id = ?1",
            [creator_id],
            |row| row.get(0),
        )?;
        Ok(count_u32(total))
    }

    pub fn count_spots_created_since(
        &self,
        creator_id: i64,
        since: DateTime<Utc>,
    ) -> Result<u32, AppError> {
        let conn = self.conn()?;
        let total: i64 = conn.query_row(
            "SELECT COUNT(*) FROM spots WHERE creator_id = ?1 AND created_at >= ?2",
            params![creator_id, format_utc_rfc3339(since)],
            |row| row.get(0),
        )?;
        Ok(count_u32(total))
    }

    /// Update a spot and, when `photos` is given, replace its media.
    ///
    /// Both writes commit together or not at all.
    pub fn update_spot(
        &self,
        id: i64,
        changes: &SpotChanges,
        photos: Option<&[MediaInput]>,
    ) -> Result<(), AppError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let updated = tx.execute(
            "UPDATE spots SET \
                 name = COALESCE(?2, name), \
                 description = COALESCE(?3, description), \
                 latitude = COALESCE(?4, latitude), \
                 longitude = COALESCE(?5, longitude), \
                 address = COALESCE(?6, address), \
                 updated_at = ?7 \
             WHERE id = ?1",
            params![
                id,
                changes.name,
                changes.description,
                changes.latitude,
                changes.longitude,
                changes.address,
                format_utc_rfc3339(Utc::now()),
            ],
        )?;
        if updated == 0 {
            return Err(AppError::NotFound(format!("Spot {} not found", id)));
        }

        if let Some(photos) = photos {
            replace_media_on(&tx, MediaOwner::Spot(id), photos)?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Delete a spot. Its media go with it; activities keep existing
    /// without a spot.
    pub fn delete_spot(&self, id: i64) -> Result<bool, AppError> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM spots WHERE id = ?1", [id])?;
        if deleted > 0 {
            tracing::info!(spot_id = id, "Deleted spot");
        }
        Ok(deleted > 0)
    }
}
