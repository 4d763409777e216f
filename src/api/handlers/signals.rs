//! Trading-signal ingestion endpoints.
//!
//! Each endpoint validates synchronously, then acknowledges and hands
//! the fan-out to a detached task. A client disconnecting after the ack
//! does not cancel deliveries.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::Router;
use serde_json::Value;
use std::sync::Arc;

use super::require_json;
use crate::api::dto::AckResponse;
use crate::app_state::AppState;
use crate::error::{ErrorResponse, RelayError};
use crate::events::{CopySignal, ScalpUpdate, TradeSummary};

/// `POST /signals/copy` — ingest a copy-trade signal.
///
/// # Errors
///
/// Returns [`RelayError::Validation`] or [`RelayError::InvalidBody`] as
/// a 400; fan-out failures never surface here.
#[utoipa::path(
    post,
    path = "/api/v1/signals/copy",
    tag = "Signals",
    summary = "Ingest a copy-trade signal",
    description = "Validates the payload, acknowledges immediately and fans the notification out to every subscriber channel in the background.",
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Accepted for processing", body = AckResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
    )
)]
pub async fn ingest_copy_signal(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, RelayError> {
    let signal = CopySignal::parse(&require_json(body)?)?;
    tracing::info!(trader_uid = %signal.trader_uid, "copy signal accepted");
    let dispatcher = Arc::clone(&state.dispatcher);
    tokio::spawn(async move {
        dispatcher.dispatch_copy_signal(signal).await;
    });
    Ok(Json(AckResponse::accepted()))
}

/// `POST /signals/trade-summary` — ingest a closed-position summary.
///
/// # Errors
///
/// Returns [`RelayError::Validation`] or [`RelayError::InvalidBody`] as
/// a 400.
#[utoipa::path(
    post,
    path = "/api/v1/signals/trade-summary",
    tag = "Signals",
    summary = "Ingest a trade summary",
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Accepted for processing", body = AckResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
    )
)]
pub async fn ingest_trade_summary(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, RelayError> {
    let summary = TradeSummary::parse(&require_json(body)?)?;
    tracing::info!(trader_uid = %summary.trader_uid, "trade summary accepted");
    let dispatcher = Arc::clone(&state.dispatcher);
    tokio::spawn(async move {
        dispatcher.dispatch_trade_summary(summary).await;
    });
    Ok(Json(AckResponse::accepted()))
}

/// `POST /signals/scalp-update` — ingest a TP/SL set or update.
///
/// # Errors
///
/// Returns [`RelayError::Validation`] or [`RelayError::InvalidBody`] as
/// a 400.
#[utoipa::path(
    post,
    path = "/api/v1/signals/scalp-update",
    tag = "Signals",
    summary = "Ingest a TP/SL update",
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Accepted for processing", body = AckResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
    )
)]
pub async fn ingest_scalp_update(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, RelayError> {
    let update = ScalpUpdate::parse(&require_json(body)?)?;
    tracing::info!(trader_uid = %update.trader_uid, update = update.is_update(), "scalp update accepted");
    let dispatcher = Arc::clone(&state.dispatcher);
    tokio::spawn(async move {
        dispatcher.dispatch_scalp_update(update).await;
    });
    Ok(Json(AckResponse::accepted()))
}

/// Signal routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/signals/copy", post(ingest_copy_signal))
        .route("/signals/trade-summary", post(ingest_trade_summary))
        .route("/signals/scalp-update", post(ingest_scalp_update))
}
