// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User queries.

use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};

use super::Db;
use crate::error::AppError;
use crate::models::{NewUser, User, UserChanges};
use crate::time_utils::format_utc_rfc3339;

const USER_COLUMNS: &str = "id, google_id, email, username, display_name, avatar_url, bio, \
                            privacy_level, created_at, updated_at";

/// Longest numeric suffix search before giving up on a base name.
const MAX_USERNAME_ATTEMPTS: u32 = 1000;

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        google_id: row.get(1)?,
        email: row.get(2)?,
        username: row.get(3)?,
        display_name: row.get(4)?,
        avatar_url: row.get(5)?,
        bio: row.get(6)?,
        privacy_level: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

impl Db {
    /// Insert a user. The username must already be normalized.
    pub fn create_user(&self, user: &NewUser) -> Result<User, AppError> {
        let conn = self.conn()?;
        let now = format_utc_rfc3339(Utc::now());

        conn.execute(
            "INSERT INTO users (google_id, email, username, display_name, avatar_url, \
                                privacy_level, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            params![
                user.google_id,
                user.email,
                user.username,
                user.display_name,
                user.avatar_url,
                user.privacy_level,
                now,
            ],
        )?;
        let id = conn.last_insert_rowid();

        tracing::info!(user_id = id, username = %user.username, "Created user");

        conn.query_row(
            &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
            [id],
            row_to_user,
        )
        .map_err(AppError::from)
    }

    pub fn get_user(&self, id: i64) -> Result<Option<User>, AppError> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
                [id],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    /// Look up by username (case-insensitive, usernames are stored lowercase).
    pub fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE username = lower(?1)", USER_COLUMNS),
                [username],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    pub fn get_user_by_google_id(&self, google_id: &str) -> Result<Option<User>, AppError> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE google_id = ?1", USER_COLUMNS),
                [google_id],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE email = ?1", USER_COLUMNS),
                [email],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    /// Attach a Google account to an existing user that signed up with the
    /// same email. The avatar is only filled in when the user has none.
    pub fn link_google_account(
        &self,
        user_id: i64,
        google_id: &str,
        avatar_url: Option<&str>,
    ) -> Result<User, AppError> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE users SET google_id = ?2, avatar_url = COALESCE(avatar_url, ?3), \
                              updated_at = ?4 \
             WHERE id = ?1",
            params![user_id, google_id, avatar_url, format_utc_rfc3339(Utc::now())],
        )?;
        conn.query_row(
            &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
            [user_id],
            row_to_user,
        )
        .map_err(AppError::from)
    }

    /// Apply a partial profile update and return the new row.
    pub fn update_user(&self, user_id: i64, changes: &UserChanges) -> Result<User, AppError> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE users SET \
                 username = COALESCE(?2, username), \
                 display_name = COALESCE(?3, display_name), \
                 bio = COALESCE(?4, bio), \
                 avatar_url = COALESCE(?5, avatar_url), \
                 privacy_level = COALESCE(?6, privacy_level), \
                 updated_at = ?7 \
             WHERE id = ?1",
            params![
                user_id,
                changes.username,
                changes.display_name,
                changes.bio,
                changes.avatar_url,
                changes.privacy_level,
                format_utc_rfc3339(Utc::now()),
            ],
        )?;
        if updated == 0 {
            return Err(AppError::NotFound(format!("User {} not found", user_id)));
        }

        conn.query_row(
            &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
            [user_id],
            row_to_user,
        )
        .map_err(AppError::from)
    }

    /// First free username among `base`, `base1`, `base2`, ...
    pub fn unique_username(&self, base: &str) -> Result<String, AppError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT 1 FROM users WHERE username = ?1")?;

        for attempt in 0..MAX_USERNAME_ATTEMPTS {
            let candidate = if attempt == 0 {
                base.to_string()
            } else {
                format!("{}{}", base, attempt)
            };
            if !stmt.exists([&candidate])? {
                return Ok(candidate);
            }
        }

        Err(AppError::Conflict(format!(
            "No free username derived from '{}'",
            base
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support;
    use crate::models::PrivacyLevel;

    #[test]
    fn test_create_and_lookup() {
        let db = test_support::db();
        let created = db
            .create_user(&NewUser {
                google_id: Some("g-123".to_string()),
                email: Some("rikyu@example.com".to_string()),
                username: "rikyu".to_string(),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(created.privacy_level, PrivacyLevel::Public);
        assert_eq!(db.get_user(created.id).unwrap().unwrap().username, "rikyu");
        assert!(db.get_user_by_username("RIKYU").unwrap().is_some());
        assert!(db.get_user_by_google_id("g-123").unwrap().is_some());
        assert!(db.get_user_by_email("rikyu@example.com").unwrap().is_some());
        assert!(db.get_user(created.id + 1).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_username_is_conflict() {
        let db = test_support::db();
        test_support::user(&db, "sen", PrivacyLevel::Public);
        let err = db
            .create_user(&NewUser {
                username: "sen".to_string(),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn test_unique_username_appends_suffix() {
        let db = test_support::db();
        assert_eq!(db.unique_username("matcha").unwrap(), "matcha");
        test_support::user(&db, "matcha", PrivacyLevel::Public);
        test_support::user(&db, "matcha1", PrivacyLevel::Public);
        assert_eq!(db.unique_username("matcha").unwrap(), "matcha2");
    }

    #[test]
    fn test_update_user_partial() {
        let db = test_support::db();
        let id = test_support::user(&db, "houjicha", PrivacyLevel::Public);

        let updated = db
            .update_user(
                id,
                &UserChanges {
                    bio: Some("roasted".to_string()),
                    privacy_level: Some(PrivacyLevel::Friends),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.username, "houjicha");
        assert_eq!(updated.bio.as_deref(), Some("roasted"));
        assert_eq!(updated.privacy_level, PrivacyLevel::Friends);
    }

    #[test]
    fn test_link_google_account_keeps_existing_avatar() {
        let db = test_support::db();
        let user = db
            .create_user(&NewUser {
                email: Some("a@example.com".to_string()),
                username: "a".to_string(),
                avatar_url: Some("https://img/own.png".to_string()),
                ..Default::default()
            })
            .unwrap();

        let linked = db
            .link_google_account(user.id, "g-9", Some("https://img/google.png"))
            .unwrap();
        assert_eq!(linked.google_id.as_deref(), Some("g-9"));
        assert_eq!(linked.avatar_url.as_deref(), Some("https://img/own.png"));
    }
}
