// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Spot listing, nearby search and GeoJSON export.

use geo::{Distance, Haversine, Point};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde::Deserialize;
use std::cmp::Ordering;

use crate::db::{BoundingBox, Db, SpotFilter};
use crate::error::{AppError, Result};
use crate::models::{
    CreateSpotRequest, MediaOwner, NewSpot, Page, PageRequest, SpotChanges, SpotDetail,
    SpotRecord, SpotView, UpdateSpotRequest,
};
use crate::services::feed::FeedService;
use crate::services::privacy::check_visible;

pub const DEFAULT_RADIUS_KM: f64 = 10.0;
pub const MAX_RADIUS_KM: f64 = 500.0;

/// Activities embedded in a spot detail.
pub const RECENT_ACTIVITY_COUNT: u32 = 10;

/// Lower bound on the length of one degree, so the prefilter box is never
/// smaller than the search circle.
const KM_PER_DEGREE: f64 = 111.0;

/// `?search=&lat=&lng=&radius_km=` query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpotQuery {
    pub search: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius_km: Option<f64>,
}

/// Validated nearby search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearbySearch {
    pub center: Point<f64>,
    pub radius_km: f64,
}

impl NearbySearch {
    /// None when no coordinates were given.
    pub fn from_query(query: &SpotQuery) -> Result<Option<Self>> {
        let (lat, lng) = match (query.lat, query.lng) {
            (None, None) => {
                if query.radius_km.is_some() {
                    return Err(AppError::validation("radius_km requires lat and lng"));
                }
                return Ok(None);
            }
            (Some(lat), Some(lng)) => (lat, lng),
            _ => return Err(AppError::validation("lat and lng must be given together")),
        };

        if !(-90.0..=90.0).contains(&lat) {
            return Err(AppError::validation("lat must be between -90 and 90"));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(AppError::validation("lng must be between -180 and 180"));
        }

        let radius_km = query.radius_km.unwrap_or(DEFAULT_RADIUS_KM);
        if !(radius_km > 0.0 && radius_km <= MAX_RADIUS_KM) {
            return Err(AppError::validation(format!(
                "radius_km must be greater than 0 and at most {}",
                MAX_RADIUS_KM
            )));
        }

        Ok(Some(Self {
            center: Point::new(lng, lat),
            radius_km,
        }))
    }

    /// Rectangle containing the search circle.
    pub fn bounding_box(&self) -> BoundingBox {
        let lat = self.center.y();
        let lng = self.center.x();
        let lat_delta = self.radius_km / KM_PER_DEGREE;
        let min_lat = (lat - lat_delta).max(-90.0);
        let max_lat = (lat + lat_delta).min(90.0);

        // Longitude degrees shrink toward the poles; size the box for the
        // most poleward latitude it touches.
        let widest = min_lat.abs().max(max_lat.abs()).to_radians().cos();
        let lng_delta = if widest > 1e-6 {
            self.radius_km / (KM_PER_DEGREE * widest)
        } else {
            f64::INFINITY
        };

        let (min_lng, max_lng) = if lng - lng_delta < -180.0 || lng + lng_delta > 180.0 {
            (-180.0, 180.0)
        } else {
            (lng - lng_delta, lng + lng_delta)
        };

        BoundingBox {
            min_lat,
            max_lat,
            min_lng,
            max_lng,
        }
    }

    pub fn distance_km(&self, latitude: f64, longitude: f64) -> f64 {
        Haversine.distance(self.center, Point::new(longitude, latitude)) / 1000.0
    }
}

#[derive(Clone)]
pub struct SpotService {
    db: Db,
    feed: FeedService,
}

impl SpotService {
    pub fn new(db: Db, feed: FeedService) -> Self {
        Self { db, feed }
    }

    fn views(&self, records: Vec<(SpotRecord, Option<f64>)>) -> Result<Vec<SpotView>> {
        let ids: Vec<i64> = records.iter().map(|(r, _)| r.id).collect();
        let mut media = self.db.media_for_spots(&ids)?;
        Ok(records
            .into_iter()
            .map(|(record, distance)| {
                let id = record.id;
                SpotView::from_record(record, media.remove(&id).unwrap_or_default(), distance)
            })
            .collect())
    }

    /// Spots whose creator is visible to the viewer. With coordinates the
    /// result is ranked by distance; otherwise newest first.
    pub fn list_spots(
        &self,
        viewer: Option<i64>,
        query: &SpotQuery,
        page: PageRequest,
    ) -> Result<Page<SpotView>> {
        let mut filter = SpotFilter {
            search: query.search.clone(),
            bounds: None,
        };

        let Some(nearby) = NearbySearch::from_query(query)? else {
            let records = self
                .db
                .list_visible_spots(viewer, &filter, Some(page.limit), page.offset())?;
            let total = self.db.count_visible_spots(viewer, &filter)?;
            let records = records.into_iter().map(|r| (r, None)).collect();
            return Ok(Page::new(self.views(records)?, page, total));
        };

        filter.bounds = Some(nearby.bounding_box());
        let mut ranked: Vec<(SpotRecord, f64)> = self
            .db
            .list_visible_spots(viewer, &filter, None, 0)?
            .into_iter()
            .map(|r| {
                let d = nearby.distance_km(r.latitude, r.longitude);
                (r, d)
            })
            .filter(|(_, d)| *d <= nearby.radius_km)
            .collect();
        ranked.sort_by(|(a, da), (b, db)| {
            da.partial_cmp(db)
                .unwrap_or(Ordering::Equal)
                .then(a.id.cmp(&b.id))
        });

        let total = u32::try_from(ranked.len()).unwrap_or(u32::MAX);
        let records = ranked
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .map(|(r, d)| (r, Some(round_km(d))))
            .collect();

        tracing::debug!(
            lat = nearby.center.y(),
            lng = nearby.center.x(),
            radius_km = nearby.radius_km,
            total,
            "Nearby spot search"
        );

        Ok(Page::new(self.views(records)?, page, total))
    }

    /// Every visible spot as a GeoJSON FeatureCollection of points.
    pub fn geojson(&self, viewer: Option<i64>) -> Result<FeatureCollection> {
        let records = self
            .db
            .list_visible_spots(viewer, &SpotFilter::default(), None, 0)?;
        let features = records.iter().map(spot_feature).collect();
        Ok(FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        })
    }

    /// Spot with media and its most recent activities. Embedded activities
    /// are filtered on each owner's profile level.
    pub fn get_spot(&self, viewer: Option<i64>, id: i64) -> Result<SpotDetail> {
        let record = self
            .db
            .get_spot(id)?
            .ok_or_else(|| AppError::NotFound(format!("Spot {} not found", id)))?;

        if !check_visible(&self.db, viewer, record.creator_id, record.creator_privacy)? {
            return Err(AppError::Forbidden(
                "You do not have access to this spot".to_string(),
            ));
        }

        let media = self.db.list_media(MediaOwner::Spot(id))?;
        let recent = self
            .db
            .list_spot_activities_by_owner_level(viewer, id, RECENT_ACTIVITY_COUNT)?;

        Ok(SpotDetail {
            spot: SpotView::from_record(record, media, None),
            recent_activities: self.feed.assemble(viewer, recent)?,
        })
    }

    /// Spots created by `username`, gated on that user's profile level.
    pub fn list_user_spots(
        &self,
        viewer: Option<i64>,
        username: &str,
        page: PageRequest,
    ) -> Result<Page<SpotView>> {
        let user = self
            .db
            .get_user_by_username(username)?
            .ok_or_else(|| AppError::NotFound(format!("User '{}' not found", username)))?;

        if !check_visible(&self.db, viewer, user.id, user.privacy_level)? {
            return Err(AppError::Forbidden(format!(
                "The spots of '{}' are not visible to you",
                user.username
            )));
        }

        let records = self
            .db
            .list_spots_by_creator(user.id, page.limit, page.offset())?;
        let total = self.db.count_spots_by_creator(user.id)?;
        let records = records.into_iter().map(|r| (r, None)).collect();
        Ok(Page::new(self.views(records)?, page, total))
    }

    pub fn create_spot(&self, user_id: i64, request: CreateSpotRequest) -> Result<SpotView> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(AppError::validation("name must not be blank"));
        }

        let id = self.db.create_spot(&NewSpot {
            creator_id: user_id,
            name: name.to_string(),
            description: request.description,
            latitude: request.latitude,
            longitude: request.longitude,
            address: request.address,
        })?;
        if let Some(photos) = request.photos.as_deref() {
            self.db.add_media(MediaOwner::Spot(id), photos)?;
        }

        self.owned_view(id)
    }

    /// Owner-only update. Field changes and photo replacement commit
    /// together.
    pub fn update_spot(
        &self,
        user_id: i64,
        id: i64,
        request: UpdateSpotRequest,
    ) -> Result<SpotView> {
        self.owned_record(user_id, id)?;

        let name = match request.name.as_deref().map(str::trim) {
            Some("") => return Err(AppError::validation("name must not be blank")),
            other => other.map(String::from),
        };
        let changes = SpotChanges {
            name,
            description: request.description,
            latitude: request.latitude,
            longitude: request.longitude,
            address: request.address,
        };
        self.db.update_spot(id, &changes, request.photos.as_deref())?;

        tracing::info!(spot_id = id, user_id, "Updated spot");
        self.owned_view(id)
    }

    pub fn delete_spot(&self, user_id: i64, id: i64) -> Result<()> {
        self.owned_record(user_id, id)?;
        if !self.db.delete_spot(id)? {
            return Err(AppError::NotFound(format!("Spot {} not found", id)));
        }
        Ok(())
    }

    fn owned_record(&self, user_id: i64, id: i64) -> Result<SpotRecord> {
        let record = self
            .db
            .get_spot(id)?
            .ok_or_else(|| AppError::NotFound(format!("Spot {} not found", id)))?;
        if record.creator_id != user_id {
            tracing::warn!(spot_id = id, user_id, "Rejected spot change by non-creator");
            return Err(AppError::Forbidden(
                "Only the creator can change this spot".to_string(),
            ));
        }
        Ok(record)
    }

    fn owned_view(&self, id: i64) -> Result<SpotView> {
        let record = self
            .db
            .get_spot(id)?
            .ok_or_else(|| AppError::NotFound(format!("Spot {} not found", id)))?;
        let media = self.db.list_media(MediaOwner::Spot(id))?;
        Ok(SpotView::from_record(record, media, None))
    }
}

fn round_km(km: f64) -> f64 {
    (km * 100.0).round() / 100.0
}

fn spot_feature(record: &SpotRecord) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert("id".to_string(), record.id.into());
    properties.insert("name".to_string(), record.name.clone().into());
    properties.insert(
        "address".to_string(),
        record
            .address
            .clone()
            .map_or(serde_json::Value::Null, serde_json::Value::from),
    );
    properties.insert("activity_count".to_string(), record.activity_count.into());

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(vec![
            record.longitude,
            record.latitude,
        ]))),
        id: Some(geojson::feature::Id::Number(record.id.into())),
        properties: Some(properties),
        foreign_members: None,
    }
}
