//! Errors surfaced over HTTP.

use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::gateway::GatewayError;
use crate::signature::SignatureError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("missing configuration: {0}")]
    MissingConfig(&'static str),

    #[error("{0}")]
    BadRequest(String),

    #[error("invalid webhook signature: {0}")]
    Unauthorized(#[from] SignatureError),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("payment gateway request failed: {0}")]
    Upstream(#[from] GatewayError),

    #[error("internal error")]
    Internal,
}

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingConfig(_) | Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingConfig(_) => "configuration_error",
            Self::BadRequest(_) => "bad_request",
            Self::Unauthorized(_) => "unauthorized",
            Self::NotFound(_) => "not_found",
            Self::MethodNotAllowed => "method_not_allowed",
            Self::Upstream(_) => "upstream_error",
            Self::Internal => "internal_error",
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::MissingConfig(_) | Self::Internal => tracing::error!(error = %self, "request failed"),
            Self::Upstream(_) => tracing::warn!(error = %self, "gateway request failed"),
            _ => tracing::debug!(error = %self, "request rejected"),
        }
        // Upstream bodies may echo credentials or internals; keep the detail in logs.
        let message = match &self {
            Self::Upstream(GatewayError::Status { status, .. }) => format!("payment gateway returned HTTP {status}"),
            Self::Upstream(_) => "payment gateway unavailable".to_owned(),
            other => other.to_string(),
        };
        (status, Json(ErrorEnvelope { error: ErrorBody { code: self.code(), message } })).into_response()
    }
}
