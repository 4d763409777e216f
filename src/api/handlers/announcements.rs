//! CMS announcement broadcast endpoint.

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::IntoResponse;
use axum::routing::post;
use serde_json::Value;
use std::sync::Arc;

use super::require_json;
use crate::api::dto::AckResponse;
use crate::app_state::AppState;
use crate::error::{ErrorResponse, RelayError};
use crate::events::Announcement;

/// `POST /announcements` — broadcast CMS content.
///
/// With a `topic_name` the announcement goes to that topic's channels;
/// without one it goes to every enabled destination. Translations are
/// matched per destination locale.
///
/// # Errors
///
/// Returns [`RelayError::Validation`] or [`RelayError::InvalidBody`] as
/// a 400.
#[utoipa::path(
    post,
    path = "/api/v1/announcements",
    tag = "Announcements",
    summary = "Broadcast an announcement",
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Accepted for processing", body = AckResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
    )
)]
pub async fn broadcast_announcement(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, RelayError> {
    let announcement = Announcement::parse(&require_json(body)?)?;
    tracing::info!(topic = ?announcement.topic_name, "announcement accepted");
    let dispatcher = Arc::clone(&state.dispatcher);
    tokio::spawn(async move {
        dispatcher.dispatch_announcement(announcement).await;
    });
    Ok(Json(AckResponse::accepted()))
}

/// Announcement routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/announcements", post(broadcast_announcement))
}
