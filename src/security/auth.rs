//! Static API key authentication.

use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::http::request::request_id;
use crate::observability::metrics;

pub const X_API_KEY: &str = "x-api-key";

/// The accepted API key. Swappable at runtime when the config is reloaded.
#[derive(Clone)]
pub struct ApiKey {
    current: Arc<ArcSwap<String>>,
}

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(key.into())),
        }
    }

    /// Replace the accepted key. In-flight checks see either the old or the new key.
    pub fn rotate(&self, key: impl Into<String>) {
        self.current.store(Arc::new(key.into()));
    }

    pub fn matches(&self, presented: &str) -> bool {
        constant_time_eq(self.current.load().as_bytes(), presented.as_bytes())
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Reject requests whose `X-API-KEY` header does not match the configured key.
pub async fn api_key_middleware(
    State(key): State<ApiKey>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let authorized = request
        .headers()
        .get(X_API_KEY)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| key.matches(value));

    if authorized {
        return next.run(request).await;
    }

    tracing::warn!(
        request_id = request_id(request.headers()).unwrap_or("unknown"),
        path = %request.uri().path(),
        "Rejected request with invalid API key"
    );
    metrics::record_unauthorized();
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({ "error": "Unauthorized" })),
    )
        .into_response()
}
