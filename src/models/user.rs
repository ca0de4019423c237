// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model and privacy levels.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Visibility level shared by users and activities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum PrivacyLevel {
    #[default]
    Public,
    Friends,
    Private,
}

impl PrivacyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrivacyLevel::Public => "public",
            PrivacyLevel::Friends => "friends",
            PrivacyLevel::Private => "private",
        }
    }
}

impl std::str::FromStr for PrivacyLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(PrivacyLevel::Public),
            "friends" => Ok(PrivacyLevel::Friends),
            "private" => Ok(PrivacyLevel::Private),
            other => Err(format!("unknown privacy level '{}'", other)),
        }
    }
}

impl ToSql for PrivacyLevel {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for PrivacyLevel {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

/// User row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    /// Google account subject (None for users created by other means)
    #[serde(skip_serializing)]
    pub google_id: Option<String>,
    pub email: Option<String>,
    /// Unique, always lowercase
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub privacy_level: PrivacyLevel,
    pub created_at: String,
    pub updated_at: String,
}

/// Fields needed to insert a user.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub google_id: Option<String>,
    pub email: Option<String>,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub privacy_level: PrivacyLevel,
}

/// Profile update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub privacy_level: Option<PrivacyLevel>,
}

/// `PUT /api/users/profile` body.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 3, max = 30))]
    pub username: Option<String>,
    #[validate(length(max = 100))]
    pub display_name: Option<String>,
    #[validate(length(max = 500))]
    pub bio: Option<String>,
    #[validate(length(max = 500))]
    pub avatar_url: Option<String>,
    pub privacy_level: Option<PrivacyLevel>,
}

/// Public fields of a user, embedded in other resources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserSummary {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: i64,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// Profile page payload.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserProfile {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: i64,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub privacy_level: PrivacyLevel,
    pub created_at: String,
    pub follower_count: u32,
    pub following_count: u32,
    pub spot_count: u32,
    /// Activities of this user the viewer is allowed to see
    pub activity_count: u32,
    pub is_following: bool,
}

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 30;

/// Normalize a requested username: trimmed, lowercase.
pub fn normalize_username(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Whether `name` (already normalized) is 3-30 chars of `[a-z0-9_]`.
pub fn is_valid_username(name: &str) -> bool {
    (USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&name.len())
        && name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
}

/// Turn arbitrary text (usually an email local part) into a username base.
///
/// Disallowed characters become `_`. The result leaves room for a numeric
/// suffix and is padded when too short.
pub fn normalize_username_base(raw: &str) -> String {
    let mut base: String = raw
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '_' => c,
            _ => '_',
        })
        .collect();
    base = base.trim_matches('_').to_string();
    base.truncate(USERNAME_MAX_LEN - 4);

    if base.is_empty() {
        "tea_drinker".to_string()
    } else if base.len() < USERNAME_MIN_LEN {
        format!("{}_tea", base)
    } else {
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_privacy_level_serde_is_lowercase() {
        let json = serde_json::to_string(&PrivacyLevel::Friends).unwrap();
        assert_eq!(json, "\"friends\"");
        let parsed: PrivacyLevel = serde_json::from_str("\"private\"").unwrap();
        assert_eq!(parsed, PrivacyLevel::Private);
        assert!(serde_json::from_str::<PrivacyLevel>("\"secret\"").is_err());
    }

    #[test]
    fn test_privacy_level_default_is_public() {
        assert_eq!(PrivacyLevel::default(), PrivacyLevel::Public);
    }

    #[test]
    fn test_normalize_username() {
        assert_eq!(normalize_username("  Matcha_Fan "), "matcha_fan");
    }

    #[test]
    fn test_is_valid_username() {
        assert!(is_valid_username("matcha_fan"));
        assert!(is_valid_username("abc"));
        assert!(!is_valid_username("ab"));
        assert!(!is_valid_username("has-dash"));
        assert!(!is_valid_username("Upper"));
        assert!(!is_valid_username(&"a".repeat(31)));
    }

    #[test]
    fn test_normalize_username_base() {
        assert_eq!(normalize_username_base("Rikyu.Sen"), "rikyu_sen");
        assert_eq!(normalize_username_base("jo"), "jo_tea");
        assert_eq!(normalize_username_base("..."), "tea_drinker");
        assert_eq!(normalize_username_base("茶人"), "tea_drinker");
        assert_eq!(normalize_username_base(&"x".repeat(40)).len(), 26);
        assert!(is_valid_username(&normalize_username_base("a.b+c@d")));
    }
}
