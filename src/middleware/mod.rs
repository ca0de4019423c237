// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware modules (sessions, rate limiting, security, etc.).

pub mod auth;
pub mod context;
pub mod rate_limit;
pub mod security;

pub use auth::{resolve_session, AuthUser, Session, Viewer};
pub use context::attach_request_context;
pub use rate_limit::{rate_limit, RateLimiter};
pub use security::add_security_headers;
