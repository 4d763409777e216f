//! Report ingestion endpoints: holdings snapshots and weekly summaries.

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
use crate::events::{HoldingReport, WeeklyReport};

/// `POST /reports/holdings` — ingest a holding report (one trader or a
/// list of traders; one message per trader either way).
///
/// # Errors
///
/// Returns [`RelayError::Validation`] or [`RelayError::InvalidBody`] as
/// a 400, with positional context for list payloads.
#[utoipa::path(
    post,
    path = "/api/v1/reports/holdings",
    tag = "Reports",
    summary = "Ingest a holding report",
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Accepted for processing", body = AckResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
    )
)]
pub async fn ingest_holding_report(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, RelayError> {
    let report = HoldingReport::parse(&require_json(body)?)?;
    tracing::info!(traders = report.traders.len(), "holding report accepted");
    let dispatcher = Arc::clone(&state.dispatcher);
    tokio::spawn(async move {
        dispatcher.dispatch_holding_report(report).await;
    });
    Ok(Json(AckResponse::accepted()))
}

/// `POST /reports/weekly` — ingest a weekly performance report.
///
/// # Errors
///
/// Returns [`RelayError::Validation`] or [`RelayError::InvalidBody`] as
/// a 400.
#[utoipa::path(
    post,
    path = "/api/v1/reports/weekly",
    tag = "Reports",
    summary = "Ingest a weekly report",
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Accepted for processing", body = AckResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
    )
)]
pub async fn ingest_weekly_report(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, RelayError> {
    let report = WeeklyReport::parse(&require_json(body)?)?;
    tracing::info!(trader_uid = %report.trader_uid, "weekly report accepted");
    let dispatcher = Arc::clone(&state.dispatcher);
    tokio::spawn(async move {
        dispatcher.dispatch_weekly_report(report).await;
    });
    Ok(Json(AckResponse::accepted()))
}

/// Report routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reports/holdings", post(ingest_holding_report))
        .route("/reports/weekly", post(ingest_weekly_report))
}
