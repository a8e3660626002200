//! Request-scoped metadata.
//!
//! The outermost middleware stamps each request with the instant it arrived.
//! Handlers extract it as [`RequestStart`] and hand it to the envelope, so the
//! reported duration covers admission, authentication and the handler itself.

use std::convert::Infallible;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, Request},
    middleware::Next,
    response::Response,
};

pub const X_REQUEST_ID: &str = "x-request-id";

/// Instant at which the gateway first saw the request.
#[derive(Debug, Clone, Copy)]
pub struct RequestStart(Instant);

impl RequestStart {
    pub fn now() -> Self {
        Self(Instant::now())
    }

    pub fn at(instant: Instant) -> Self {
        Self(instant)
    }

    pub fn instant(&self) -> Instant {
        self.0
    }

    /// Time since the request arrived. Never negative.
    pub fn elapsed(&self) -> Duration {
        Instant::now().saturating_duration_since(self.0)
    }
}

impl<S> FromRequestParts<S> for RequestStart
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Falls back to now when the capture layer is not installed (e.g. in
        // handler unit tests).
        Ok(parts
            .extensions
            .get::<RequestStart>()
            .copied()
            .unwrap_or_else(RequestStart::now))
    }
}

/// Middleware recording the arrival instant. Must be installed outside the
/// admission and authentication layers.
pub async fn capture_request_start(mut request: Request<Body>, next: Next) -> Response {
    request.extensions_mut().insert(RequestStart::now());
    next.run(request).await
}

/// The request ID set by the request-id layer, if any.
pub fn request_id(headers: &HeaderMap) -> Option<&str> {
    headers.get(X_REQUEST_ID).and_then(|v| v.to_str().ok())
}
