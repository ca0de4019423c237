// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google OAuth client and sign-in account linking.
//!
//! Handles:
//! - Building the consent URL
//! - Exchanging the authorization code for an access token
//! - Fetching the account's userinfo
//! - Mapping the Google account onto a local user

use serde::Deserialize;

use crate::db::Db;
use crate::error::AppError;
use crate::models::{normalize_username_base, NewUser, PrivacyLevel, User};

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// Google OAuth client. Sign-in is disabled when no credentials are set.
#[derive(Clone)]
pub struct GoogleOAuthClient {
    http: reqwest::Client,
    credentials: Option<(String, String)>,
}

impl GoogleOAuthClient {
    pub fn new(client_id: Option<String>, client_secret: Option<String>) -> Self {
        let credentials = match (client_id, client_secret) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => Some((id, secret)),
            _ => None,
        };
        Self {
            http: reqwest::Client::new(),
            credentials,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    fn credentials(&self) -> Result<(&str, &str), AppError> {
        self.credentials
            .as_ref()
            .map(|(id, secret)| (id.as_str(), secret.as_str()))
            .ok_or_else(|| AppError::Upstream("Google sign-in is not configured".to_string()))
    }

    /// Consent screen URL carrying the signed `state`.
    pub fn authorize_url(&self, redirect_uri: &str, state: &str) -> Result<String, AppError> {
        let (client_id, _) = self.credentials()?;
        Ok(format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}&prompt=select_account",
            AUTH_URL,
            urlencoding::encode(client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode("openid email profile"),
            urlencoding::encode(state),
        ))
    }

    /// Exchange an authorization code for an access token.
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<GoogleTokenResponse, AppError> {
        let (client_id, client_secret) = self.credentials()?;
        let response = self
            .http
            .post(TOKEN_URL)
            .form(&[
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("code", code),
                ("redirect_uri", redirect_uri),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Token exchange failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Google token exchange failed");
            return Err(AppError::Upstream(format!(
                "Token exchange failed with status {}",
                status
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to parse token response: {}", e)))
    }

    /// Profile of the account that granted `access_token`.
    pub async fn fetch_userinfo(&self, access_token: &str) -> Result<GoogleUserInfo, AppError> {
        let response = self
            .http
            .get(USERINFO_URL)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Userinfo request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::Upstream(format!(
                "Userinfo request failed with status {}",
                status
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to parse userinfo: {}", e)))
    }
}

/// Token endpoint response (fields we use).
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleTokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

/// OpenID Connect userinfo.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleUserInfo {
    /// Stable account identifier
    pub sub: String,
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// Find or create the local user for a Google account.
///
/// Lookup order: the linked Google id, then a verified email matching an
/// existing user (which gets linked), then a new user whose username is
/// derived from the email local part.
pub fn upsert_google_user(db: &Db, info: &GoogleUserInfo) -> Result<User, AppError> {
    if let Some(user) = db.get_user_by_google_id(&info.sub)? {
        return Ok(user);
    }

    if let Some(email) = info.email.as_deref().filter(|_| info.email_verified) {
        if let Some(user) = db.get_user_by_email(email)? {
            tracing::info!(user_id = user.id, "Linking Google account to existing user");
            return db.link_google_account(user.id, &info.sub, info.picture.as_deref());
        }
    }

    let local_part = info
        .email
        .as_deref()
        .and_then(|e| e.split('@').next())
        .or(info.name.as_deref())
        .unwrap_or("");
    let username = db.unique_username(&normalize_username_base(local_part))?;

    db.create_user(&NewUser {
        google_id: Some(info.sub.clone()),
        email: info.email.clone().filter(|_| info.email_verified),
        username,
        display_name: info.name.clone(),
        avatar_url: info.picture.clone(),
        privacy_level: PrivacyLevel::Public,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support;

    fn info(sub: &str, email: &str, verified: bool) -> GoogleUserInfo {
        GoogleUserInfo {
            sub: sub.to_string(),
            email: Some(email.to_string()),
            email_verified: verified,
            name: Some("Sen no Rikyu".to_string()),
            picture: Some("https://lh3.example.com/p.png".to_string()),
        }
    }

    #[test]
    fn test_unconfigured_client_refuses() {
        let client = GoogleOAuthClient::new(None, Some("secret".to_string()));
        assert!(!client.is_configured());
        assert!(matches!(
            client.authorize_url("http://localhost/cb", "s"),
            Err(AppError::Upstream(_))
        ));
    }

    #[test]
    fn test_authorize_url_encodes_parameters() {
        let client = GoogleOAuthClient::new(Some("id-1".to_string()), Some("s".to_string()));
        let url = client
            .authorize_url("http://localhost:8080/auth/google/callback", "a|b")
            .unwrap();
        assert!(url.starts_with(AUTH_URL));
        assert!(url.contains("client_id=id-1"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A8080%2Fauth%2Fgoogle%2Fcallback"));
        assert!(url.contains("scope=openid%20email%20profile"));
        assert!(url.contains("state=a%7Cb"));
    }

    #[test]
    fn test_upsert_creates_then_reuses() {
        let db = test_support::db();
        let first = upsert_google_user(&db, &info("g-1", "Rikyu.Sen@example.com", true)).unwrap();
        assert_eq!(first.username, "rikyu_sen");
        assert_eq!(first.display_name.as_deref(), Some("Sen no Rikyu"));

        let again = upsert_google_user(&db, &info("g-1", "changed@example.com", true)).unwrap();
        assert_eq!(again.id, first.id);
    }

    #[test]
    fn test_upsert_deduplicates_username() {
        let db = test_support::db();
        let a = upsert_google_user(&db, &info("g-1", "tea@one.example", true)).unwrap();
        let b = upsert_google_user(&db, &info("g-2", "tea@two.example", true)).unwrap();
        assert_eq!(a.username, "tea");
        assert_eq!(b.username, "tea1");
    }

    #[test]
    fn test_upsert_links_only_verified_email() {
        let db = test_support::db();
        let existing = db
            .create_user(&NewUser {
                email: Some("host@example.com".to_string()),
                username: "host".to_string(),
                ..Default::default()
            })
            .unwrap();

        let unverified = upsert_google_user(&db, &info("g-x", "host@example.com", false)).unwrap();
        assert_ne!(unverified.id, existing.id);
        assert!(unverified.email.is_none());

        let linked = upsert_google_user(&db, &info("g-y", "host@example.com", true)).unwrap();
        assert_eq!(linked.id, existing.id);
        assert_eq!(linked.google_id.as_deref(), Some("g-y"));
    }
}
