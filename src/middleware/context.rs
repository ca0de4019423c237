// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Adds request path and method to error envelopes.

use crate::error::ErrorBody;
use axum::{
    body::Body,
    extract::Request,
    http::header,
    middleware::Next,
    response::Response,
};

/// Rewrite error bodies produced by [`crate::error::AppError`] so they
/// carry the request's path and method.
pub async fn attach_request_context(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;
    let Some(error) = response.extensions().get::<ErrorBody>().cloned() else {
        return response;
    };

    let (mut parts, body) = response.into_parts();
    let error = ErrorBody {
        path: Some(path),
        method: Some(method),
        ..error
    };

    match serde_json::to_vec(&error) {
        Ok(bytes) => {
            parts.headers.remove(header::CONTENT_LENGTH);
            parts.extensions.insert(error);
            Response::from_parts(parts, Body::from(bytes))
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize error body");
            Response::from_parts(parts, body)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use axum::http::StatusCode;
    use axum::{routing::get, Router};
    use tower::ServiceExt; // for oneshot

    #[tokio::test]
    async fn test_error_body_gains_path_and_method() {
        let app = Router::new()
            .route(
                "/api/spots/{id}",
                get(|| async { AppError::NotFound("Spot not found".to_string()) }),
            )
            .layer(axum::middleware::from_fn(attach_request_context));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/spots/9?x=1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["error"], "Spot not found");
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["path"], "/api/spots/9");
        assert_eq!(json["method"], "GET");
    }

    #[tokio::test]
    async fn test_success_untouched() {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(axum::middleware::from_fn(attach_request_context));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"ok");
    }
}
