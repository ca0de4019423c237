// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT session resolution and authentication extractors.
//!
//! [`resolve_session`] runs on every request and records a [`Session`] in
//! the request extensions. Handlers then pick the access level they need:
//! [`AuthUser`] for required authentication, [`Viewer`] when anonymous
//! access is allowed.

use crate::db::{run_blocking, Db};
use crate::error::AppError;
use crate::models::User;
use crate::AppState;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Cookie carrying the session JWT.
pub const SESSION_COOKIE: &str = "teamap_token";

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Outcome of looking at the request's credentials.
#[derive(Debug, Clone)]
pub enum Session {
    /// No token presented
    Anonymous,
    Authenticated(User),
    /// A token was presented but is bad, expired, or names a deleted user
    Rejected,
}

/// Middleware that resolves the caller's session.
pub async fn resolve_session(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let session = match session_token(&jar, request.headers()) {
        None => Session::Anonymous,
        Some(token) => {
            run_blocking(move || load_session(&state.db, &state.config.jwt_signing_key, &token))
                .await?
        }
    };
    request.extensions_mut().insert(session);

    Ok(next.run(request).await)
}

/// Token from the session cookie, falling back to a Bearer header.
fn session_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

fn load_session(db: &Db, signing_key: &[u8], token: &str) -> Result<Session, AppError> {
    let user_id = match verify_jwt(token, signing_key) {
        Ok(id) => id,
        Err(e) => {
            tracing::debug!(error = %e, "Rejected session token");
            return Ok(Session::Rejected);
        }
    };

    Ok(match db.get_user(user_id)? {
        Some(user) => Session::Authenticated(user),
        None => {
            tracing::warn!(user_id, "Session token for missing user");
            Session::Rejected
        }
    })
}

/// Create a JWT for a user session.
pub fn create_jwt(user_id: i64, signing_key: &[u8], ttl_days: i64) -> anyhow::Result<String> {
    let now = chrono::Utc::now().timestamp();
    let exp = now + ttl_days * 24 * 60 * 60;

    let claims = Claims {
        sub: user_id.to_string(),
        iat: usize::try_from(now)?,
        exp: usize::try_from(exp)?,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

/// Validate signature and expiry; returns the user ID.
pub fn verify_jwt(token: &str, signing_key: &[u8]) -> anyhow::Result<i64> {
    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);
    let data = decode::<Claims>(token, &key, &validation)?;
    Ok(data.claims.sub.parse()?)
}

/// Session cookie for a freshly issued token.
pub fn session_cookie(token: String, ttl_days: i64, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::days(ttl_days))
        .build()
}

/// Authenticated caller. Rejects with 401 otherwise.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl AuthUser {
    pub fn id(&self) -> i64 {
        self.0.id
    }
}

impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<Session>() {
            Some(Session::Authenticated(user)) => Ok(AuthUser(user.clone())),
            Some(Session::Rejected) => Err(AppError::InvalidToken),
            Some(Session::Anonymous) | None => Err(AppError::Unauthorized),
        }
    }
}

/// Caller on optional-auth routes. Bad tokens count as anonymous.
#[derive(Debug, Clone)]
pub struct Viewer(pub Option<User>);

impl Viewer {
    pub fn id(&self) -> Option<i64> {
        self.0.as_ref().map(|u| u.id)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Viewer {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(match parts.extensions.get::<Session>() {
            Some(Session::Authenticated(user)) => Viewer(Some(user.clone())),
            _ => Viewer(None),
        })
    }
}
