// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fixed-window request limiter keyed by client address.

use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Key used when the client address is unknown.
const SHARED_KEY: &str = "shared";

/// Prune expired windows once the table grows past this many clients.
const PRUNE_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Per-client request counter.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    clients: DashMap<String, Window>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(window_secs.max(1)),
            clients: DashMap::new(),
        }
    }

    /// Count a request from `key`. On refusal returns the seconds until the
    /// window resets.
    pub fn check(&self, key: &str) -> Result<(), u64> {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> Result<(), u64> {
        if self.clients.len() > PRUNE_THRESHOLD {
            let window = self.window;
            self.clients
                .retain(|_, w| now.saturating_duration_since(w.started) < window);
        }

        let mut entry = self.clients.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });

        let elapsed = now.saturating_duration_since(entry.started);
        if elapsed >= self.window {
            *entry = Window {
                started: now,
                count: 0,
            };
        }

        if entry.count >= self.max_requests {
            let remaining = self.window.saturating_sub(elapsed);
            return Err(remaining.as_secs().max(1));
        }

        entry.count += 1;
        Ok(())
    }
}

/// Client key: first `X-Forwarded-For` hop, then `X-Real-IP`.
fn client_key(headers: &HeaderMap) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim);
    let real_ip = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim);

    forwarded
        .filter(|v| !v.is_empty())
        .or(real_ip.filter(|v| !v.is_empty()))
        .unwrap_or(SHARED_KEY)
        .to_string()
}

/// Middleware enforcing the limiter in [`AppState`].
pub async fn rate_limit(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let key = client_key(request.headers());
    if let Err(retry_after_secs) = state.rate_limiter.check(&key) {
        tracing::warn!(client = %key, retry_after_secs, "Rate limit exceeded");
        return Err(AppError::RateLimited { retry_after_secs });
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_limit_and_reset() {
        let limiter = RateLimiter::new(2, 60);
        let start = Instant::now();

        assert!(limiter.check_at("a", start).is_ok());
        assert!(limiter.check_at("a", start).is_ok());
        let retry = limiter
            .check_at("a", start + Duration::from_secs(15))
            .unwrap_err();
        assert_eq!(retry, 45);

        // Other clients are unaffected.
        assert!(limiter.check_at("b", start).is_ok());

        assert!(limiter
            .check_at("a", start + Duration::from_secs(60))
            .is_ok());
    }

    #[test]
    fn test_retry_after_is_at_least_one_second() {
        let limiter = RateLimiter::new(1, 1);
        let start = Instant::now();
        limiter.check_at("a", start).unwrap();
        assert_eq!(
            limiter
                .check_at("a", start + Duration::from_millis(999))
                .unwrap_err(),
            1
        );
    }

    #[test]
    fn test_client_key_sources() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_key(&headers), SHARED_KEY);

        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));
        assert_eq!(client_key(&headers), "10.0.0.2");

        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        assert_eq!(client_key(&headers), "203.0.113.7");
    }
}
