//! HTTP error mapping.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Error body returned by every failing endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

/// Errors surfaced by HTTP handlers, one per response status.
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    PayloadTooLarge(String),
    Internal(clipshare_core::Error),
}

impl From<clipshare_core::Error> for ApiError {
    fn from(err: clipshare_core::Error) -> Self {
        use clipshare_core::Error;

        match err {
            Error::NotFound(id) => ApiError::NotFound(format!("Collection {} not found", id)),
            Error::ItemNotFound(id) => ApiError::NotFound(format!("Item {} not found", id)),
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            Error::Conflict(msg) => ApiError::Conflict(msg),
            other => ApiError::Internal(other),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(rejection.body_text())
        } else {
            ApiError::BadRequest(rejection.body_text())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => {
                tracing::debug!(error = %msg, "Not found");
                (StatusCode::NOT_FOUND, msg)
            }
            ApiError::BadRequest(msg) => {
                tracing::debug!(error = %msg, "Bad request");
                (StatusCode::BAD_REQUEST, msg)
            }
            ApiError::PayloadTooLarge(msg) => {
                tracing::debug!(error = %msg, "Payload too large");
                (StatusCode::PAYLOAD_TOO_LARGE, msg)
            }
            ApiError::Conflict(msg) => {
                tracing::warn!(error = %msg, "Conflict");
                (StatusCode::CONFLICT, msg)
            }
            ApiError::Internal(err) => {
                tracing::error!(error = %err, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
