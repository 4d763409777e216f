//! Synchronous user verification endpoint.

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, post};

use crate::api::dto::{VerifyRequest, VerifyResponse};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, RelayError};

/// `POST /verify` — run the verification flow for one user.
///
/// Unlike the signal endpoints this one is synchronous: the caller needs
/// the outcome message to show the user.
///
/// # Errors
///
/// Returns [`RelayError::Persistence`] on store failure and
/// [`RelayError::Upstream`] when the authority is unreachable.
#[utoipa::path(
    post,
    path = "/api/v1/verify",
    tag = "Verification",
    summary = "Verify a user's code",
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "Verification outcome", body = VerifyResponse),
        (status = 502, description = "Verification authority unreachable", body = ErrorResponse),
    )
)]
pub async fn verify_user(
    State(state): State<AppState>,
    Json(request): Json<VerifyRequest>,
) -> Result<impl IntoResponse, RelayError> {
    let outcome = state
        .verification
        .verify(
            &request.user_id,
            &request.group_id,
            &request.code,
            &request.admin_mention,
        )
        .await?;
    tracing::info!(user_id = %request.user_id, verified = outcome.verified, "verification handled");
    Ok(Json(VerifyResponse {
        verified: outcome.verified,
        message: outcome.message,
    }))
}

/// `DELETE /verify/{group_id}/{user_id}` — revoke a user's verification,
/// typically when they leave the group.
///
/// # Errors
///
/// Returns [`RelayError::NotFound`] when no verification record exists.
#[utoipa::path(
    delete,
    path = "/api/v1/verify/{group_id}/{user_id}",
    tag = "Verification",
    summary = "Revoke a user's verification",
    params(
        ("group_id" = String, Path, description = "Group the verification belongs to"),
        ("user_id" = String, Path, description = "User whose verification is revoked"),
    ),
    responses(
        (status = 204, description = "Verification revoked"),
        (status = 404, description = "No verification record", body = ErrorResponse),
    )
)]
pub async fn revoke_verification(
    State(state): State<AppState>,
    Path((group_id, user_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, RelayError> {
    if !state.verification.revoke(&user_id, &group_id).await? {
        return Err(RelayError::NotFound(format!(
            "no verification for user {user_id} in group {group_id}"
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Verification routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/verify", post(verify_user))
        .route("/verify/{group_id}/{user_id}", delete(revoke_verification))
}
