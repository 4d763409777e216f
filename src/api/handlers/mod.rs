//! REST endpoint handlers organized by resource.

pub mod announcements;
pub mod groups;
pub mod reports;
pub mod signals;
pub mod system;
pub mod verify;

use axum::Router;
use axum::extract::rejection::JsonRejection;
use axum::Json;
use serde_json::Value;

use crate::app_state::AppState;
use crate::error::RelayError;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(signals::routes())
        .merge(reports::routes())
        .merge(announcements::routes())
        .merge(verify::routes())
        .merge(groups::routes())
}

/// Unwraps the raw JSON body, mapping extractor rejections (wrong
/// content type, malformed JSON) to a 400 with a message.
pub(crate) fn require_json(
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Value, RelayError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => Err(RelayError::InvalidBody(rejection.body_text())),
    }
}
