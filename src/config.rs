// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.

use hkdf::Hkdf;
use sha2::Sha256;
use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Frontend URL for OAuth redirects and CORS
    pub frontend_url: String,
    /// Public base URL of this API (used for the OAuth callback)
    pub api_url: String,
    /// SQLite database file
    pub database_path: String,
    /// Server port
    pub port: u16,
    /// Session lifetime in days
    pub session_ttl_days: i64,
    /// Requests allowed per client per window
    pub rate_limit_max_requests: u32,
    /// Rate limit window length in seconds
    pub rate_limit_window_secs: u64,
    /// Google OAuth client ID (sign-in disabled when unset)
    pub google_client_id: Option<String>,

    // --- Secrets ---
    /// Google OAuth client secret
    pub google_client_secret: Option<String>,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// HMAC key for the OAuth `state` parameter
    pub oauth_state_key: Vec<u8>,
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port = env::var("PORT").unwrap_or_else(|_| "8080".to_string());
        let port = port.parse().map_err(|_| ConfigError::Invalid("PORT", port))?;

        let jwt_signing_key = env::var("JWT_SIGNING_KEY")
            .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
            .into_bytes();
        if jwt_signing_key.len() < 32 {
            return Err(ConfigError::Invalid(
                "JWT_SIGNING_KEY",
                "must be at least 32 bytes".to_string(),
            ));
        }

        let oauth_state_key = match env::var("OAUTH_STATE_KEY") {
            Ok(v) => v.trim().as_bytes().to_vec(),
            Err(_) => derive_key(&jwt_signing_key, b"tea-map oauth state")?,
        };

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            api_url: env::var("API_URL").unwrap_or_else(|_| format!("http://localhost:{}", port)),
            database_path: env::var("DATABASE_PATH").unwrap_or_else(|_| "tea_map.db".to_string()),
            port,
            session_ttl_days: parse_or("SESSION_TTL_DAYS", 7)?,
            rate_limit_max_requests: parse_or("RATE_LIMIT_MAX_REQUESTS", 300)?,
            rate_limit_window_secs: parse_or("RATE_LIMIT_WINDOW_SECS", 900)?,
            google_client_id: env::var("GOOGLE_CLIENT_ID").ok().map(|v| v.trim().to_string()),
            google_client_secret: env::var("GOOGLE_CLIENT_SECRET")
                .ok()
                .map(|v| v.trim().to_string()),
            jwt_signing_key,
            oauth_state_key,
        })
    }

    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:3000".to_string(),
            api_url: "http://localhost:8080".to_string(),
            database_path: ":memory:".to_string(),
            port: 8080,
            session_ttl_days: 7,
            rate_limit_max_requests: 10_000,
            rate_limit_window_secs: 900,
            google_client_id: Some("test-client-id.apps.googleusercontent.com".to_string()),
            google_client_secret: Some("test_secret".to_string()),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!!".to_vec(),
            oauth_state_key: b"test_oauth_state_key".to_vec(),
        }
    }

    /// Whether cookies should carry the `Secure` attribute.
    pub fn secure_cookies(&self) -> bool {
        self.frontend_url.starts_with("https://")
    }
}

fn parse_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}

/// Derive a purpose-bound key from the JWT signing key.
fn derive_key(ikm: &[u8], info: &[u8]) -> Result<Vec<u8>, ConfigError> {
    let hk = Hkdf::<Sha256>::new(None, ikm);
    let mut okm = [0u8; 32];
    hk.expand(info, &mut okm)
        .map_err(|_| ConfigError::Invalid("OAUTH_STATE_KEY", "key derivation failed".to_string()))?;
    Ok(okm.to_vec())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
