//! Uniform response envelope.
//!
//! Every handler finishes by emitting exactly one envelope:
//!
//! ```json
//! {
//!   "error": false,
//!   "data": { ... },
//!   "message": "Database Created",
//!   "action": "mysql-create-database",
//!   "timestamp": "2024-05-01T12:00:00.123Z",
//!   "action_duration": 12
//! }
//! ```
//!
//! `data` is `null` whenever `error` is `true`. `action_duration` is the number
//! of milliseconds between the captured request start and emission.

use std::fmt::Display;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::http::request::RequestStart;
use crate::observability::metrics;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub error: bool,
    pub data: Option<T>,
    pub message: String,
    pub action: String,
    pub timestamp: DateTime<Utc>,
    pub action_duration: u64,
}

impl<T> Envelope<T> {
    pub fn success(
        data: T,
        start: RequestStart,
        action: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: false,
            data: Some(data),
            message: message.into(),
            action: action.into(),
            timestamp: Utc::now(),
            action_duration: duration_ms(start),
        }
    }

    pub fn failure(
        err: &(impl Display + ?Sized),
        start: RequestStart,
        action: impl Into<String>,
    ) -> Self {
        Self {
            error: true,
            data: None,
            message: err.to_string(),
            action: action.into(),
            timestamp: Utc::now(),
            action_duration: duration_ms(start),
        }
    }
}

fn duration_ms(start: RequestStart) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Emit a 200 success envelope.
pub fn emit_success<T: Serialize>(
    data: T,
    start: RequestStart,
    action: &str,
    message: &str,
) -> Response {
    tracing::info!(action = %action, "{}", message);
    metrics::record_action(action, "success", start.elapsed());

    let envelope = Envelope::success(data, start, action, message);
    (StatusCode::OK, Json(envelope)).into_response()
}

/// Emit a 400 error envelope.
pub fn emit_error<E: Display + ?Sized>(err: &E, start: RequestStart, action: &str) -> Response {
    emit_error_with_status(StatusCode::BAD_REQUEST, err, start, action)
}

/// Emit an error envelope with an explicit status code.
pub fn emit_error_with_status<E: Display + ?Sized>(
    status: StatusCode,
    err: &E,
    start: RequestStart,
    action: &str,
) -> Response {
    tracing::error!(action = %action, error = %err, status = status.as_u16(), "{}", err);
    metrics::record_action(action, "error", start.elapsed());

    let envelope: Envelope<()> = Envelope::failure(err, start, action);
    (status, Json(envelope)).into_response()
}
