//! Handler-level errors, reported through the error envelope.

use axum::extract::rejection::{BytesRejection, JsonRejection};
use axum::http::StatusCode;
use thiserror::Error;

use crate::database::backend::{BackendError, Engine};
use crate::database::credentials::CredentialError;
use crate::database::types::InvalidField;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The body could not be read or parsed as the expected JSON schema.
    #[error("{0}")]
    Body(String),

    #[error(transparent)]
    Validation(#[from] InvalidField),

    #[error("{0} backend is not configured")]
    NotConfigured(Engine),

    #[error(transparent)]
    Credentials(#[from] CredentialError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("failed to collect host metrics: {0}")]
    HostMetrics(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::HostMetrics(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Stage-specific action suffix, for failures that happen before the
    /// operation itself runs.
    pub fn stage(&self) -> Option<&'static str> {
        match self {
            ApiError::Body(_) => Some("bind-json"),
            ApiError::Validation(_) => Some("validation"),
            ApiError::NotConfigured(_) => Some("not-configured"),
            ApiError::Credentials(_) => Some("random-string"),
            _ => None,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Body(rejection.body_text())
    }
}

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        ApiError::Body(rejection.body_text())
    }
}
