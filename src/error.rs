//! Relay error types with HTTP status code mapping.
//!
//! [`RelayError`] is the central error type for the service. Validation
//! errors are the only class a client ever sees on the event path — the
//! acknowledgement is sent before fan-out begins, so everything later is
//! logged, counted, and dropped.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 1001,
///     "message": "missing fields: trader_uid, pair",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges on [`RelayError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category          | HTTP Status               |
/// |-----------|-------------------|---------------------------|
/// | 1000–1999 | Validation        | 400 Bad Request           |
/// | 2000–2999 | Not Found         | 404 Not Found             |
/// | 3000–3999 | Server / pipeline | 500 / 502                 |
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Event payload failed validation; the message names every offending
    /// field, not just the first.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Request body was not `application/json` or could not be parsed.
    #[error("invalid body: {0}")]
    InvalidBody(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Target resolution failed; treated as "no subscribers" by dispatch.
    #[error("target resolution failed: {0}")]
    ResolutionFailed(String),

    /// Template or card rendering failure. Rendering degrades rather than
    /// failing a target, so this stays internal.
    #[error("render failed: {0}")]
    RenderFailed(String),

    /// One destination's delivery failed; isolated to that destination.
    #[error("delivery to channel {channel_id} failed: {reason}")]
    DeliveryFailed {
        /// Destination channel that did not receive the message.
        channel_id: i64,
        /// Transport-level cause (permission, not-found, network…).
        reason: String,
    },

    /// Database operation failure.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// An upstream collaborator (social graph, verification authority,
    /// content queue) returned an error.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RelayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::Validation(_) => 1001,
            Self::InvalidBody(_) => 1002,
            Self::NotFound(_) => 2001,
            Self::Persistence(_) => 3001,
            Self::ResolutionFailed(_) => 3002,
            Self::RenderFailed(_) => 3003,
            Self::DeliveryFailed { .. } => 3004,
            Self::Upstream(_) => 3005,
            Self::Internal(_) => 3000,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidBody(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Persistence(_)
            | Self::ResolutionFailed(_)
            | Self::RenderFailed(_)
            | Self::DeliveryFailed { .. }
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for RelayError {
    fn from(error: sqlx::Error) -> Self {
        Self::Persistence(error.to_string())
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
