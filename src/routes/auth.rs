// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google OAuth sign-in and session routes.

use axum::{
    extract::State,
    http::StatusCode,
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use ring::rand::{SecureRandom, SystemRandom};
use serde::Deserialize;
use sha2::Sha256;
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::db::run_blocking;
use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, session_cookie, AuthUser, SESSION_COOKIE};
use crate::models::User;
use crate::routes::{ApiQuery, ApiResponse};
use crate::services::upsert_google_user;
use crate::AppState;

// Type alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

/// Cookie binding the OAuth `state` to the browser that started the flow.
pub const NONCE_COOKIE: &str = "teamap_oauth_nonce";

/// How long a signed `state` stays valid.
const STATE_MAX_AGE_MS: i64 = 10 * 60 * 1000;

/// Tolerated clock skew for `state` timestamps in the future.
const STATE_CLOCK_SKEW_MS: i64 = 60 * 1000;

/// Browser-facing OAuth routes plus logout.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/google", get(auth_start))
        .route("/auth/google/callback", get(auth_callback))
        .route("/auth/logout", post(logout))
        .route("/api/auth/me", get(me))
}

// ─── OAuth State ─────────────────────────────────────────────

/// Why a `state` parameter was refused.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    #[error("malformed state")]
    Malformed,
    #[error("state signature mismatch")]
    BadSignature,
    #[error("state expired")]
    Expired,
}

/// Contents of a verified `state`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedState {
    pub frontend_url: String,
    pub nonce: String,
}

fn state_mac(secret: &[u8], payload: &str) -> Result<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(payload.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Sign `frontend_url|timestamp_hex|nonce` and encode it for the URL.
pub fn sign_state(
    secret: &[u8],
    frontend_url: &str,
    timestamp_ms: i64,
    nonce: &str,
) -> Result<String> {
    let payload = format!("{}|{:x}|{}", frontend_url, timestamp_ms, nonce);
    let signature = state_mac(secret, &payload)?;
    let signed = format!("{}|{}", payload, hex::encode(signature));
    Ok(URL_SAFE_NO_PAD.encode(signed.as_bytes()))
}

/// Check the signature (constant time) and age of a `state` parameter.
pub fn verify_state(
    state: &str,
    secret: &[u8],
    now_ms: i64,
) -> std::result::Result<VerifiedState, StateError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(state)
        .map_err(|_| StateError::Malformed)?;
    let decoded = String::from_utf8(bytes).map_err(|_| StateError::Malformed)?;

    // The frontend URL may itself contain '|', so split from the right.
    let mut parts = decoded.rsplitn(4, '|');
    let (Some(signature_hex), Some(nonce), Some(timestamp_hex), Some(frontend_url)) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(StateError::Malformed);
    };

    let provided = hex::decode(signature_hex).map_err(|_| StateError::Malformed)?;
    let payload = format!("{}|{}|{}", frontend_url, timestamp_hex, nonce);
    let expected = state_mac(secret, &payload).map_err(|_| StateError::BadSignature)?;
    if !bool::from(expected.ct_eq(&provided)) {
        return Err(StateError::BadSignature);
    }

    let issued_ms = i64::from_str_radix(timestamp_hex, 16).map_err(|_| StateError::Malformed)?;
    let age = now_ms - issued_ms;
    if age > STATE_MAX_AGE_MS || age < -STATE_CLOCK_SKEW_MS {
        return Err(StateError::Expired);
    }

    Ok(VerifiedState {
        frontend_url: frontend_url.to_string(),
        nonce: nonce.to_string(),
    })
}

fn random_nonce() -> Result<String> {
    let mut bytes = [0u8; 16];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG failure")))?;
    Ok(hex::encode(bytes))
}

/// Only the configured frontend and local development origins may be
/// redirected to after sign-in.
fn is_allowed_frontend(candidate: &str, configured: &str) -> bool {
    candidate == configured
        || candidate.starts_with(&format!("{}/", configured))
        || candidate.starts_with("http://localhost")
        || candidate.starts_with("http://127.0.0.1")
}

fn nonce_cookie(nonce: String, secure: bool) -> Cookie<'static> {
    Cookie::build((NONCE_COOKIE, nonce))
        .path("/auth")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::milliseconds(STATE_MAX_AGE_MS))
        .build()
}

fn callback_url(state: &AppState) -> String {
    format!(
        "{}/auth/google/callback",
        state.config.api_url.trim_end_matches('/')
    )
}

fn error_redirect(frontend_url: &str, error: &str) -> Redirect {
    Redirect::temporary(&format!(
        "{}/auth/callback?error={}",
        frontend_url.trim_end_matches('/'),
        urlencoding::encode(error)
    ))
}

// ─── Handlers ────────────────────────────────────────────────

/// Query parameters for starting OAuth flow.
#[derive(Deserialize)]
pub struct AuthStartParams {
    /// Frontend URL to return to; defaults to `FRONTEND_URL`.
    #[serde(default)]
    redirect_uri: Option<String>,
}

/// Start OAuth flow - redirect to Google's consent screen.
async fn auth_start(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    ApiQuery(params): ApiQuery<AuthStartParams>,
) -> Result<(CookieJar, Redirect)> {
    let frontend_url = match params.redirect_uri {
        Some(uri) if is_allowed_frontend(&uri, &state.config.frontend_url) => uri,
        Some(uri) => {
            tracing::warn!(redirect_uri = %uri, "Ignoring disallowed redirect_uri");
            state.config.frontend_url.clone()
        }
        None => state.config.frontend_url.clone(),
    };

    let nonce = random_nonce()?;
    let oauth_state = sign_state(
        &state.config.oauth_state_key,
        &frontend_url,
        chrono::Utc::now().timestamp_millis(),
        &nonce,
    )?;
    let auth_url = state
        .google
        .authorize_url(&callback_url(&state), &oauth_state)?;

    tracing::info!(frontend_url = %frontend_url, "Starting OAuth flow, redirecting to Google");

    let jar = jar.add(nonce_cookie(nonce, state.config.secure_cookies()));
    Ok((jar, Redirect::temporary(&auth_url)))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// OAuth callback - verify state, exchange code, create session.
async fn auth_callback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    ApiQuery(params): ApiQuery<CallbackParams>,
) -> (CookieJar, Redirect) {
    let default_frontend = state.config.frontend_url.clone();
    let cookie_nonce = jar.get(NONCE_COOKIE).map(|c| c.value().to_string());
    let jar = jar.remove(Cookie::build(NONCE_COOKIE).path("/auth"));

    let verified = match params.state.as_deref().map(|s| {
        verify_state(
            s,
            &state.config.oauth_state_key,
            chrono::Utc::now().timestamp_millis(),
        )
    }) {
        Some(Ok(v)) => v,
        Some(Err(e)) => {
            tracing::warn!(error = %e, "Rejected OAuth state");
            return (jar, error_redirect(&default_frontend, "invalid_state"));
        }
        None => {
            tracing::warn!("OAuth callback without state");
            return (jar, error_redirect(&default_frontend, "invalid_state"));
        }
    };

    let nonce_matches = cookie_nonce
        .as_deref()
        .is_some_and(|n| bool::from(n.as_bytes().ct_eq(verified.nonce.as_bytes())));
    if !nonce_matches {
        tracing::warn!("OAuth nonce cookie missing or mismatched");
        return (jar, error_redirect(&verified.frontend_url, "invalid_state"));
    }

    if let Some(error) = params.error {
        tracing::warn!(error = %error, "OAuth error from Google");
        return (jar, error_redirect(&verified.frontend_url, &error));
    }

    let Some(code) = params.code else {
        return (jar, error_redirect(&verified.frontend_url, "missing_code"));
    };

    match complete_sign_in(&state, &code).await {
        Ok(token) => {
            let jar = jar.add(session_cookie(
                token,
                state.config.session_ttl_days,
                state.config.secure_cookies(),
            ));
            let target = format!(
                "{}/auth/callback",
                verified.frontend_url.trim_end_matches('/')
            );
            (jar, Redirect::temporary(&target))
        }
        Err(e) => {
            tracing::error!(error = %e, "Google sign-in failed");
            (jar, error_redirect(&verified.frontend_url, "sign_in_failed"))
        }
    }
}

/// Exchange the code, map the account to a user and issue a session JWT.
async fn complete_sign_in(state: &AppState, code: &str) -> Result<String> {
    let token = state
        .google
        .exchange_code(code, &callback_url(state))
        .await?;
    let info = state.google.fetch_userinfo(&token.access_token).await?;
    let db = state.db.clone();
    let user = run_blocking(move || upsert_google_user(&db, &info)).await?;

    tracing::info!(user_id = user.id, username = %user.username, "OAuth successful");

    create_jwt(
        user.id,
        &state.config.jwt_signing_key,
        state.config.session_ttl_days,
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))
}

/// Logout - expire the session cookie.
async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
    let jar = jar
        .remove(Cookie::build(SESSION_COOKIE).path("/"))
        .remove(Cookie::build(NONCE_COOKIE).path("/auth"));
    (jar, StatusCode::NO_CONTENT)
}

/// Current user.
async fn me(user: AuthUser) -> Json<ApiResponse<User>> {
    ApiResponse::ok("Current user", user.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"secret_key";
    const NOW: i64 = 1_736_900_000_000;

    #[test]
    fn test_state_round_trip() {
        let state = sign_state(SECRET, "https://tea.example.com", NOW, "abc123").unwrap();
        let verified = verify_state(&state, SECRET, NOW + 1000).unwrap();
        assert_eq!(verified.frontend_url, "https://tea.example.com");
        assert_eq!(verified.nonce, "abc123");
    }

    #[test]
    fn test_state_with_pipe_in_url() {
        let state = sign_state(SECRET, "https://tea.example.com/?a=b|c", NOW, "n").unwrap();
        let verified = verify_state(&state, SECRET, NOW).unwrap();
        assert_eq!(verified.frontend_url, "https://tea.example.com/?a=b|c");
    }

    #[test]
    fn test_state_rejects_tampering() {
        let state = sign_state(SECRET, "https://tea.example.com", NOW, "n").unwrap();
        let decoded = String::from_utf8(URL_SAFE_NO_PAD.decode(&state).unwrap()).unwrap();
        let forged = URL_SAFE_NO_PAD.encode(
            decoded
                .replacen("https://tea.example.com", "https://evil.example.com", 1)
                .as_bytes(),
        );
        assert_eq!(
            verify_state(&forged, SECRET, NOW),
            Err(StateError::BadSignature)
        );
        assert_eq!(
            verify_state(&state, b"other_secret", NOW),
            Err(StateError::BadSignature)
        );
    }

    #[test]
    fn test_state_expires_after_ten_minutes() {
        let state = sign_state(SECRET, "https://tea.example.com", NOW, "n").unwrap();
        assert!(verify_state(&state, SECRET, NOW + STATE_MAX_AGE_MS).is_ok());
        assert_eq!(
            verify_state(&state, SECRET, NOW + STATE_MAX_AGE_MS + 1),
            Err(StateError::Expired)
        );
        assert_eq!(
            verify_state(&state, SECRET, NOW - 2 * STATE_CLOCK_SKEW_MS),
            Err(StateError::Expired)
        );
    }

    #[test]
    fn test_state_malformed() {
        assert_eq!(
            verify_state("not base64!!", SECRET, NOW),
            Err(StateError::Malformed)
        );
        let two_parts = URL_SAFE_NO_PAD.encode(b"https://x|deadbeef");
        assert_eq!(
            verify_state(&two_parts, SECRET, NOW),
            Err(StateError::Malformed)
        );
    }

    #[test]
    fn test_random_nonce_is_unique_hex() {
        let a = random_nonce().unwrap();
        let b = random_nonce().unwrap();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_allowed_frontends() {
        let configured = "https://tea.example.com";
        assert!(is_allowed_frontend("https://tea.example.com", configured));
        assert!(is_allowed_frontend("https://tea.example.com/map", configured));
        assert!(is_allowed_frontend("http://localhost:5173", configured));
        assert!(!is_allowed_frontend("https://tea.example.com.evil.io", configured));
        assert!(!is_allowed_frontend("https://evil.example.com", configured));
    }
}
