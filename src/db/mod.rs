// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer (SQLite).
//!
//! A single [`Db`] handle is opened at startup and shared through
//! `AppState`. Statements are serialized through one connection; each
//! operation takes the lock for its own duration and never across an
//! `.await`.

mod activities;
mod media;
mod schema;
mod social;
mod spots;
mod stats;
mod users;

pub use activities::FeedScope;
pub use spots::{BoundingBox, SpotFilter};

use crate::error::AppError;
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Shared database handle.
#[derive(Clone)]
pub struct Db {
    conn: Arc<Mutex<Connection>>,
}

impl Db {
    /// Open or create the database file and run migrations.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, AppError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Database(format!("failed to create database dir: {}", e))
            })?;
        }

        let conn = Connection::open(path)?;
        tracing::info!(path = %path.display(), "Opened SQLite database");
        Self::from_connection(conn)
    }

    /// In-memory database, used by tests.
    pub fn open_in_memory() -> Result<Self, AppError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, AppError> {
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        conn.execute_batch(schema::PRAGMAS)?;
        conn.execute_batch(schema::SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Access the connection for one operation.
    pub(crate) fn conn(&self) -> Result<MutexGuard<'_, Connection>, AppError> {
        self.conn
            .lock()
            .map_err(|_| AppError::Database("connection lock poisoned".to_string()))
    }

    /// Cheap liveness probe for the health endpoint.
    pub fn ping(&self) -> Result<(), AppError> {
        let conn = self.conn()?;
        conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
    }
}

/// Run synchronous database work on tokio's blocking pool.
///
/// Statements wait on the connection mutex, which must never park an
/// async worker thread.
pub async fn run_blocking<T, F>(work: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("database task failed: {}", e)))?
}

/// `?, ?, ?` for an `IN (...)` list of `n` items.
pub(crate) fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// Convert a SQLite COUNT into u32, saturating on absurd values.
pub(crate) fn count_u32(n: i64) -> u32 {
    u32::try_from(n.max(0)).unwrap_or(u32::MAX)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::models::{NewActivity, NewSpot, NewUser, PrivacyLevel};
    use chrono::{DateTime, Utc};

    pub fn db() -> Db {
        Db::open_in_memory().unwrap()
    }

    pub fn user(db: &Db, username: &str, privacy: PrivacyLevel) -> i64 {
        db.create_user(&NewUser {
            username: username.to_string(),
            privacy_level: privacy,
            ..Default::default()
        })
        .unwrap()
        .id
    }

    pub fn spot(db: &Db, creator_id: i64, name: &str) -> i64 {
        db.create_spot(&NewSpot {
            creator_id,
            name: name.to_string(),
            description: None,
            latitude: 35.0116,
            longitude: 135.7681,
            address: None,
        })
        .unwrap()
    }

    pub fn activity(
        db: &Db,
        user_id: i64,
        spot_id: Option<i64>,
        privacy: PrivacyLevel,
        created_at: DateTime<Utc>,
    ) -> i64 {
        db.create_activity(&NewActivity {
            user_id,
            spot_id,
            title: "Afternoon session".to_string(),
            description: None,
            tea_type: Some("sencha".to_string()),
            duration_minutes: Some(30),
            privacy_level: privacy,
            created_at,
        })
        .unwrap()
    }
}
